pub mod user;

pub use user::{Authenticator, AuthenticatorView, User, UserView};
