pub mod auth;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{Authenticator, SharedSecret};
pub use error::ServiceError;
pub use module::Module;
pub use types::now_millis;
