pub mod otpauth;
pub mod password;
pub mod validation;

pub use otpauth::{parse_otpauth_uri, OtpauthError, ParsedOtpauth};
pub use password::{hash_password, verify_password};
pub use validation::ValidatedJson;
