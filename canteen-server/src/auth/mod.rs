//! Authentication and authorization

pub mod jwt;
pub mod middleware;
pub mod policy;
pub mod rate_limit;

pub use jwt::{CurrentUser, JwtConfig, JwtService};
pub use policy::Action;
pub use rate_limit::RateLimiter;
