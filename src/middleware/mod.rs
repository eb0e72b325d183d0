mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{auth_middleware, authenticate, bearer_token};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, client_ip, rate_limit};
