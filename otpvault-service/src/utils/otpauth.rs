//! Pure parser for `otpauth://totp/...` provisioning URIs.
//!
//! The QR image decoding that produces these URIs is an external
//! collaborator; this module only turns an already-extracted URI into the
//! secret/issuer/account tuple the import flow needs. A malformed URI is a
//! distinct condition from "no QR code found", which never reaches this
//! parser.

use thiserror::Error;
use url::Url;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum OtpauthError {
    #[error("Invalid otpauth URI: {0}")]
    Malformed(String),

    #[error("No secret found in otpauth URI")]
    MissingSecret,
}

impl From<OtpauthError> for AppError {
    fn from(err: OtpauthError) -> Self {
        AppError::BadRequest(anyhow::anyhow!(err.to_string()))
    }
}

/// Secret/issuer/account tuple extracted from a provisioning URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOtpauth {
    pub secret: String,
    pub issuer: Option<String>,
    pub account_name: Option<String>,
    /// Issuer if known, otherwise the account label; what the UI should
    /// pre-fill as the service name.
    pub suggested_name: String,
}

/// Parse `otpauth://totp/{label}?secret=...&issuer=...`.
///
/// The label splits on the first `:` into issuer and account; an explicit
/// `issuer` query parameter wins over the label's issuer part.
pub fn parse_otpauth_uri(uri: &str) -> Result<ParsedOtpauth, OtpauthError> {
    let url = Url::parse(uri).map_err(|e| OtpauthError::Malformed(e.to_string()))?;

    if url.scheme() != "otpauth" {
        return Err(OtpauthError::Malformed(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str() != Some("totp") {
        return Err(OtpauthError::Malformed(
            "only totp URIs are supported".to_string(),
        ));
    }

    let raw_label = url.path().trim_start_matches('/');
    if raw_label.is_empty() {
        return Err(OtpauthError::Malformed("missing label".to_string()));
    }
    let label = urlencoding::decode(raw_label)
        .map_err(|e| OtpauthError::Malformed(e.to_string()))?
        .into_owned();

    let mut label_issuer = None;
    let mut account = label.clone();
    if let Some((issuer_part, account_part)) = label.split_once(':') {
        label_issuer = Some(issuer_part.trim().to_string());
        account = account_part.trim().to_string();
    }

    let mut secret = None;
    let mut query_issuer = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.into_owned()),
            "issuer" => query_issuer = Some(value.into_owned()),
            _ => {}
        }
    }

    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(OtpauthError::MissingSecret)?;

    let issuer = query_issuer
        .or(label_issuer)
        .filter(|s| !s.is_empty());

    let account_name = Some(account).filter(|s| !s.is_empty());

    let suggested_name = issuer
        .clone()
        .or_else(|| account_name.clone())
        .unwrap_or_default();

    Ok(ParsedOtpauth {
        secret,
        issuer,
        account_name,
        suggested_name,
    })
}
