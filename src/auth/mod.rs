//! Authentication & Authorization
//! Mission: Token issuing, identity resolution, and the access policy table

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod policy;

pub use jwt::JwtIssuer;
pub use middleware::auth_middleware;
