mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{current_code, TestApp, TEST_SECRET};

const OTHER_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

async fn import(app: &TestApp, token: &str, name: &str, secret: &str) -> serde_json::Value {
    let (status, body) = app
        .post_json(
            "/totp/services",
            Some(token),
            json!({ "secret": secret, "name": name }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn imported_authenticator_lists_with_current_code() {
    let app = TestApp::spawn();
    let token = app.register_and_login("alice@example.com", "password123").await;

    let body = import(&app, &token, "GitHub", TEST_SECRET).await;
    assert_eq!(body["authenticator"]["name"], "GitHub");
    assert!(body["authenticator"]["last_used_at"].is_null());

    let (status, body) = app.get("/totp/services", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let services = body["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    let code = services[0]["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    assert_eq!(body["period"], 30);
    let remaining = body["time_remaining"].as_u64().unwrap();
    assert!((1..=30).contains(&remaining));
}

#[tokio::test]
async fn secret_is_canonicalized_on_import() {
    let app = TestApp::spawn();
    let token = app.register_and_login("bob@example.com", "password123").await;

    // Lowercase with embedded whitespace, as pasted from a setup page.
    import(&app, &token, "GitHub", "jbsw y3dp ehpk 3pxp").await;

    let (status, body) = app.get("/totp/services", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["services"][0]["code"].as_str().unwrap().to_string();

    // The canonical form of the pasted secret generates the same code.
    let expected = current_code(TEST_SECRET);
    if listed != expected {
        // Window may have rolled between the two computations.
        let (_, body) = app.get("/totp/services", Some(&token)).await;
        assert_eq!(body["services"][0]["code"], current_code(TEST_SECRET));
    }
}

#[tokio::test]
async fn undecodable_or_blank_secret_is_rejected() {
    let app = TestApp::spawn();
    let token = app.register_and_login("carol@example.com", "password123").await;

    // '0', '1', '8', '9' are outside the Base32 alphabet.
    let (status, _) = app
        .post_json(
            "/totp/services",
            Some(&token),
            json!({ "secret": "0189", "name": "Broken" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/totp/services",
            Some(&token),
            json!({ "secret": "   ", "name": "Blank" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_authenticator_name_conflicts() {
    let app = TestApp::spawn();
    let token = app.register_and_login("dave@example.com", "password123").await;

    import(&app, &token, "GitHub", TEST_SECRET).await;

    let (status, _) = app
        .post_json(
            "/totp/services",
            Some(&token),
            json!({ "secret": OTHER_SECRET, "name": "GitHub" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bulk_listing_is_read_only_but_single_fetch_stamps_last_used() {
    let app = TestApp::spawn();
    let token = app.register_and_login("erin@example.com", "password123").await;

    let body = import(&app, &token, "GitHub", TEST_SECRET).await;
    let id = body["authenticator"]["id"].as_str().unwrap().to_string();

    // Listing twice leaves last-used untouched.
    app.get("/totp/services", Some(&token)).await;
    let (_, body) = app.get("/totp/services", Some(&token)).await;
    assert!(body["services"][0]["last_used_at"].is_null());

    // Fetching the single code stamps it.
    let (status, body) = app
        .get(&format!("/totp/services/{}/otp", id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], 30);
    assert_eq!(body["code"].as_str().unwrap().len(), 6);

    let (_, body) = app.get("/totp/services", Some(&token)).await;
    assert!(body["services"][0]["last_used_at"].is_string());
}

#[tokio::test]
async fn otp_verification_stamps_only_the_matching_authenticator() {
    let app = TestApp::spawn();
    let token = app.register_and_login("frank@example.com", "password123").await;

    import(&app, &token, "GitHub", TEST_SECRET).await;
    import(&app, &token, "AWS", OTHER_SECRET).await;

    let (status, body) = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "frank@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requires_2fa"], true);
    let temp_token = body["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .post_json(
            "/auth/verify-otp",
            Some(&temp_token),
            json!({ "otp": current_code(OTHER_SECRET) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/totp/services", Some(&token)).await;
    for service in body["services"].as_array().unwrap() {
        match service["name"].as_str().unwrap() {
            "AWS" => assert!(service["last_used_at"].is_string()),
            "GitHub" => assert!(service["last_used_at"].is_null()),
            other => panic!("unexpected service {}", other),
        }
    }
}

#[tokio::test]
async fn removing_the_last_authenticator_disables_2fa() {
    let app = TestApp::spawn();
    let token = app.register_and_login("grace@example.com", "password123").await;

    let body = import(&app, &token, "GitHub", TEST_SECRET).await;
    let id = body["authenticator"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .delete(&format!("/totp/services/{}", id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    // With the set empty, login is single-phase again.
    let (status, body) = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "grace@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requires_2fa"], false);
}

#[tokio::test]
async fn removing_unknown_authenticator_is_not_found() {
    let app = TestApp::spawn();
    let token = app.register_and_login("henry@example.com", "password123").await;

    let (status, _) = app
        .delete(
            &format!("/totp/services/{}", uuid::Uuid::new_v4()),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disable_removes_every_authenticator_at_once() {
    let app = TestApp::spawn();
    let token = app.register_and_login("iris@example.com", "password123").await;

    import(&app, &token, "GitHub", TEST_SECRET).await;
    import(&app, &token, "AWS", OTHER_SECRET).await;

    // A wrong code leaves everything in place.
    let (status, _) = app
        .post_json("/totp/disable", Some(&token), json!({ "otp": "000000" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json(
            "/totp/disable",
            Some(&token),
            json!({ "otp": current_code(TEST_SECRET) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/totp/services", Some(&token)).await;
    assert_eq!(body["services"].as_array().unwrap().len(), 0);

    // Disabling again reports 2FA not enabled.
    let (status, body) = app
        .post_json(
            "/totp/disable",
            Some(&token),
            json!({ "otp": current_code(TEST_SECRET) }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("not enabled"));
}

#[tokio::test]
async fn parse_endpoint_extracts_import_fields() {
    let app = TestApp::spawn();
    let token = app.register_and_login("judy@example.com", "password123").await;

    let (status, body) = app
        .post_json(
            "/totp/services/parse",
            Some(&token),
            json!({
                "uri": "otpauth://totp/GitHub:user@example.com?secret=JBSWY3DPEHPK3PXP&issuer=GitHub"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["secret"], "JBSWY3DPEHPK3PXP");
    assert_eq!(body["issuer"], "GitHub");
    assert_eq!(body["account_name"], "user@example.com");
    assert_eq!(body["suggested_name"], "GitHub");

    let (status, _) = app
        .post_json(
            "/totp/services/parse",
            Some(&token),
            json!({ "uri": "https://example.com/not-otpauth" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
