//! API Middleware
//!
//! Middleware layers for authentication, authorization and rate limiting.

pub mod auth;
pub mod rate_limit;

pub use auth::{
    optional_auth, require_admin, require_auth, AdminUser, AuthUser, JwtState, MaybeUser,
    SESSION_COOKIE,
};
pub use rate_limit::{rate_limit, RateLimiter};
