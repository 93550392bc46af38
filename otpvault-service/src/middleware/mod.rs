mod auth;

pub use auth::{auth_middleware, temp_auth_middleware, AuthUser};
