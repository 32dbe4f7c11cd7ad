mod helpers;
mod middleware;
mod password;
mod token;

pub use helpers::{TokenValidationError, ValidatedToken, extract_bearer_token, validate_token};
pub use middleware::{AuthError, RequireUser};
pub use password::{hash_password, verify_password};
pub use token::{TokenGenerator, parse_token};
