//! JWT Authentication Middleware
//!
//! Access tokens are issued by the identity provider and verified here with
//! the shared secret. The token only identifies the user; admin rights come
//! from the `users.role` column, looked up per request by [`require_admin`].

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use blunest_auth::{JwtClaims, JwtError, JwtValidator};
use blunest_db::entities::{prelude::User, user::UserRole};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated user context extracted from the access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// Raw token, forwarded to the identity provider on sign-out
    #[serde(skip)]
    pub access_token: String,
}

impl AuthUser {
    fn from_claims(claims: JwtClaims, access_token: String) -> Result<Self, JwtError> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email.unwrap_or_default(),
            full_name: claims.user_metadata.full_name,
            phone: claims.user_metadata.phone,
            access_token,
        })
    }
}

/// Admin context inserted by [`require_admin`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AdminUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    /// Create new JWT state with the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }

    fn authenticate(&self, token: &str) -> Result<AuthUser, ApiError> {
        let claims = self.validator.validate(token).map_err(|e| {
            ApiError::unauthorized(format!("Invalid or expired token: {}", e))
                .with_code("INVALID_TOKEN")
        })?;

        AuthUser::from_claims(claims, token.to_string()).map_err(|e| {
            ApiError::unauthorized(format!("Invalid or expired token: {}", e))
                .with_code("INVALID_TOKEN")
        })
    }
}

/// Session token from the `session_token` cookie or a `Bearer` header
///
/// `Ok(None)` when neither is present.
fn extract_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').map(|c| c.trim()).find_map(|c| {
                c.strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
                    .map(str::to_string)
            })
        });

    if let Some(token) = from_cookie {
        return Ok(Some(token));
    }

    let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(None);
    };

    auth_header
        .strip_prefix("Bearer ")
        .map(|t| Some(t.trim().to_string()))
        .ok_or_else(|| {
            ApiError::unauthorized("Invalid Authorization header format. Expected 'Bearer <token>'")
                .with_code("INVALID_AUTH_FORMAT")
        })
}

/// Reject requests without a valid session token
///
/// Injects [`AuthUser`] into request extensions.
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())?.ok_or_else(|| {
        ApiError::unauthorized("Missing authentication token (cookie or Authorization header)")
            .with_code("MISSING_AUTH")
    })?;

    let user = state.authenticate(&token)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Attach [`AuthUser`] when a valid token is present, continue anonymously otherwise
pub async fn optional_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match extract_token(request.headers()) {
        Ok(Some(token)) => state.authenticate(&token).ok(),
        _ => None,
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
        }
        None => debug!("Continuing without an authenticated user"),
    }

    next.run(request).await
}

/// Require `admin` or `super_admin` in `users.role`; layer inside [`require_auth`]
pub async fn require_admin(
    State(db): State<DatabaseConnection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.user_id)
        .ok_or_else(|| ApiError::unauthorized("Authentication required").with_code("MISSING_AUTH"))?;

    let profile = User::find_by_id(user_id).one(&db).await?;

    match profile {
        Some(profile) if profile.role.is_admin() => {
            request.extensions_mut().insert(AdminUser {
                user_id,
                role: profile.role,
            });
            Ok(next.run(request).await)
        }
        _ => {
            debug!("User {} denied admin access", user_id);
            Err(ApiError::forbidden("Admin access required").with_code("FORBIDDEN"))
        }
    }
}

/// The caller, when [`optional_auth`] recognised one
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
