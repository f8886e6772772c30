use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use blunest_db::entities::user;
use blunest_integrations::AdminCreateUser;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminUser;
use crate::models::{
    page_params, ApiResponse, CreateUserRequest, ErrorResponse, PageQuery, Paginated, Pagination,
    UpdateRoleRequest, UserProfile,
};
use crate::AppState;

/// List users (admin)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Paginated users, newest first", body = [UserProfile]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<UserProfile>>> {
    let (page, limit) = page_params(query.page, query.limit);

    let paginator = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Json(Paginated::new(
        rows.into_iter().map(UserProfile::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Create a user with the identity provider and a matching profile (admin)
///
/// Only super admins may create `admin` or `super_admin` accounts. When the
/// profile insert fails the provider account is deleted again.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Role requires a super admin", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    req.validate()?;

    if req.role.is_admin() && !admin.is_super_admin() {
        return Err(ApiError::forbidden("Only super admins can create admin users")
            .with_code("FORBIDDEN"));
    }

    let email = req.email.trim().to_lowercase();
    let full_name = req.full_name.trim().to_string();

    let exists = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await?
        .is_some();
    if exists {
        return Err(
            ApiError::conflict("A user with this email already exists").with_code("USER_EXISTS")
        );
    }

    let provider_user = state
        .identity
        .admin_create_user(&AdminCreateUser {
            email: email.clone(),
            password: req.password,
            full_name: full_name.clone(),
        })
        .await?;

    let now = Utc::now();
    let inserted = user::ActiveModel {
        id: Set(provider_user.id),
        email: Set(email),
        full_name: Set(Some(full_name)),
        phone: Set(None),
        role: Set(req.role),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await;

    let profile = match inserted {
        Ok(profile) => profile,
        Err(e) => {
            if let Err(cleanup) = state.identity.admin_delete_user(provider_user.id).await {
                error!(
                    "Failed to delete provider user {} after profile error: {}",
                    provider_user.id, cleanup
                );
            }
            return Err(e.into());
        }
    };

    info!(
        "User {} created with role {:?} by {}",
        profile.id, profile.role, admin.user_id
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::new(profile.into()))))
}

/// Change a user's role (super admin)
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserProfile),
        (status = 400, description = "Cannot change own role", body = ErrorResponse),
        (status = 403, description = "Super admin required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    if !admin.is_super_admin() {
        return Err(ApiError::forbidden("Only super admins can change roles").with_code("FORBIDDEN"));
    }

    if id == admin.user_id {
        return Err(ApiError::bad_request("You cannot change your own role")
            .with_code("SELF_ROLE_CHANGE"));
    }

    let existing = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found").with_code("USER_NOT_FOUND"))?;

    let previous = existing.role;
    let mut active: user::ActiveModel = existing.into();
    active.role = Set(req.role);
    active.updated_at = Set(Utc::now());
    let profile = active.update(&state.db).await?;

    info!(
        "User {} role changed from {:?} to {:?} by {}",
        id, previous, req.role, admin.user_id
    );

    Ok(Json(ApiResponse::new(profile.into())))
}
