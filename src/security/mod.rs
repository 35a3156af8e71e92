//! Security Module
//!
//! Request validation for player input and security headers for responses.

pub mod middleware;
pub mod validation;

pub use middleware::security_headers_middleware;
pub use validation::{RequestValidator, ValidationError, validators};
