use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Extension, Json,
};
use blunest_db::entities::{user, user::UserRole};
use blunest_db::is_unique_violation;
use blunest_integrations::{AuthSession, SignUpRequest as ProviderSignUp};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthUser, SESSION_COOKIE};
use crate::models::{
    ApiResponse, AuthResponse, CheckPhoneRequest, CheckPhoneResponse, ErrorResponse,
    MessageResponse, PhoneOwner, SessionTokens, SignInRequest, SignUpRequest, UserProfile,
};
use crate::AppState;

/// Fallback cookie lifetime when the provider omits `expires_in`
const DEFAULT_SESSION_SECONDS: i64 = 3600;

/// Profile fields known when a user first shows up
pub(crate) struct ProfileSeed<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Load the profile row, creating it with role `user` on first sight
pub(crate) async fn ensure_profile<C: ConnectionTrait>(
    db: &C,
    seed: ProfileSeed<'_>,
) -> ApiResult<user::Model> {
    if let Some(existing) = user::Entity::find_by_id(seed.id).one(db).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let inserted = user::ActiveModel {
        id: Set(seed.id),
        email: Set(seed.email.to_lowercase()),
        full_name: Set(seed.full_name),
        phone: Set(seed.phone),
        role: Set(UserRole::User),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await;

    match inserted {
        Ok(model) => {
            info!("Created profile for user {}", model.id);
            Ok(model)
        }
        // Concurrent first requests race on the primary key
        Err(e) if is_unique_violation(&e) => user::Entity::find_by_id(seed.id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ApiError::conflict("A user with this email already exists").with_code("USER_EXISTS")
            }),
        Err(e) => Err(e.into()),
    }
}

fn metadata_text(metadata: &serde_json::Value, key: &str) -> Option<String> {
    metadata
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn session_cookie(state: &AppState, session: &AuthSession) -> ApiResult<HeaderValue> {
    let max_age = session.expires_in.unwrap_or(DEFAULT_SESSION_SECONDS);
    let secure = if state.config.site_url.starts_with("https://") {
        "; Secure"
    } else {
        ""
    };

    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE, session.access_token, max_age, secure
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid session cookie: {}", e)))
}

fn tokens(session: AuthSession) -> SessionTokens {
    SessionTokens {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        expires_in: session.expires_in,
    }
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<(HeaderMap, Json<ApiResponse<AuthResponse>>)> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    debug!("Sign-in attempt for {}", email);

    let session = state.identity.sign_in(&email, &req.password).await?;

    let profile = ensure_profile(
        &state.db,
        ProfileSeed {
            id: session.user.id,
            email: session.user.email.as_deref().unwrap_or(&email),
            full_name: metadata_text(&session.user.user_metadata, "full_name"),
            phone: metadata_text(&session.user.user_metadata, "phone"),
        },
    )
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&state, &session)?);

    info!("User {} signed in", profile.id);

    Ok((
        headers,
        Json(ApiResponse::new(AuthResponse {
            user: profile.into(),
            session: Some(tokens(session)),
        })),
    ))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created; session is null until the email is confirmed", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, HeaderMap, Json<ApiResponse<AuthResponse>>)> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let full_name = req.full_name.trim().to_string();
    let phone = req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

    let outcome = state
        .identity
        .sign_up(&ProviderSignUp {
            email: email.clone(),
            password: req.password,
            full_name: full_name.clone(),
            phone: phone.clone(),
        })
        .await?;

    let profile = ensure_profile(
        &state.db,
        ProfileSeed {
            id: outcome.user.id,
            email: &email,
            full_name: Some(full_name),
            phone,
        },
    )
    .await?;

    let mut headers = HeaderMap::new();
    if let Some(ref session) = outcome.session {
        headers.insert(header::SET_COOKIE, session_cookie(&state, session)?);
    }

    info!("User {} signed up", profile.id);

    Ok((
        StatusCode::CREATED,
        headers,
        Json(ApiResponse::new(AuthResponse {
            user: profile.into(),
            session: outcome.session.map(tokens),
        })),
    ))
}

/// Sign out and clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<(HeaderMap, Json<ApiResponse<MessageResponse>>)> {
    // The local session ends even when the provider call fails
    if let Err(e) = state.identity.sign_out(&user.access_token).await {
        warn!("Identity provider sign-out failed for {}: {}", user.user_id, e);
    }

    let cleared = HeaderValue::from_str(&format!(
        "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid session cookie: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cleared);

    info!("User {} signed out", user.user_id);

    Ok((
        headers,
        Json(ApiResponse::new(MessageResponse::new("Signed out successfully"))),
    ))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = ensure_profile(
        &state.db,
        ProfileSeed {
            id: user.user_id,
            email: &user.email,
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
        },
    )
    .await?;

    Ok(Json(ApiResponse::new(profile.into())))
}

/// Whether a phone number already belongs to an account
#[utoipa::path(
    post,
    path = "/api/auth/check-phone",
    request_body = CheckPhoneRequest,
    responses(
        (status = 200, description = "Lookup result", body = CheckPhoneResponse),
        (status = 400, description = "Phone number missing", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn check_phone(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckPhoneRequest>,
) -> ApiResult<Json<ApiResponse<CheckPhoneResponse>>> {
    req.validate()?;

    let owner = user::Entity::find()
        .filter(user::Column::Phone.eq(req.phone.trim()))
        .one(&state.db)
        .await?;

    debug!("Phone lookup matched: {}", owner.is_some());

    Ok(Json(ApiResponse::new(CheckPhoneResponse {
        exists: owner.is_some(),
        user: owner.map(|u| PhoneOwner {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
        }),
    })))
}
