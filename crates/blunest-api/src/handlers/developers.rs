use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use blunest_db::entities::developer;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    ApiResponse, CreateDeveloperRequest, Developer, ErrorResponse, MessageResponse,
    UpdateDeveloperRequest,
};
use crate::AppState;

fn developer_not_found() -> ApiError {
    ApiError::not_found("Developer not found").with_code("DEVELOPER_NOT_FOUND")
}

/// Blank optional strings are stored as null
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// List active developers
#[utoipa::path(
    get,
    path = "/api/developers",
    responses(
        (status = 200, description = "Active developers by name", body = [Developer]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "directory"
)]
pub async fn list_developers(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<Developer>>>> {
    let developers = developer::Entity::find()
        .filter(developer::Column::IsActive.eq(true))
        .order_by_asc(developer::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        developers.into_iter().map(Developer::from).collect(),
    )))
}

/// Add a developer (admin)
#[utoipa::path(
    post,
    path = "/api/admin/developers",
    request_body = CreateDeveloperRequest,
    responses(
        (status = 201, description = "Developer created", body = Developer),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_developer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDeveloperRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Developer>>)> {
    req.validate()?;

    let now = Utc::now();
    let model = developer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.trim().to_string()),
        logo_url: Set(non_empty(req.logo_url)),
        description: Set(non_empty(req.description)),
        website_url: Set(non_empty(req.website_url)),
        email: Set(non_empty(req.email)),
        phone: Set(non_empty(req.phone)),
        years_of_experience: Set(req.years_of_experience),
        total_projects: Set(req.total_projects),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!("Developer {} ({}) created", model.name, model.id);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(model.into()))))
}

/// Update a developer (admin)
#[utoipa::path(
    put,
    path = "/api/admin/developers/{id}",
    params(
        ("id" = Uuid, Path, description = "Developer ID")
    ),
    request_body = UpdateDeveloperRequest,
    responses(
        (status = 200, description = "Developer updated", body = Developer),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Developer not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_developer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeveloperRequest>,
) -> ApiResult<Json<ApiResponse<Developer>>> {
    req.validate()?;

    let existing = developer::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(developer_not_found)?;

    let mut active: developer::ActiveModel = existing.into();

    if let Some(name) = req.name {
        active.name = Set(name.trim().to_string());
    }
    if req.logo_url.is_some() {
        active.logo_url = Set(non_empty(req.logo_url));
    }
    if req.description.is_some() {
        active.description = Set(non_empty(req.description));
    }
    if req.website_url.is_some() {
        active.website_url = Set(non_empty(req.website_url));
    }
    if req.email.is_some() {
        active.email = Set(non_empty(req.email));
    }
    if req.phone.is_some() {
        active.phone = Set(non_empty(req.phone));
    }
    if let Some(years) = req.years_of_experience {
        active.years_of_experience = Set(Some(years));
    }
    if let Some(total) = req.total_projects {
        active.total_projects = Set(Some(total));
    }
    if let Some(is_active) = req.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    info!("Developer {} updated", id);

    Ok(Json(ApiResponse::new(model.into())))
}

/// Deactivate a developer (admin)
///
/// The row is kept so existing references stay valid; it no longer appears
/// in the public directory.
#[utoipa::path(
    delete,
    path = "/api/admin/developers/{id}",
    params(
        ("id" = Uuid, Path, description = "Developer ID")
    ),
    responses(
        (status = 200, description = "Developer deactivated", body = MessageResponse),
        (status = 404, description = "Developer not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn delete_developer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let result = developer::Entity::update_many()
        .col_expr(developer::Column::IsActive, Expr::value(false))
        .col_expr(developer::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(developer::Column::Id.eq(id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(developer_not_found());
    }

    info!("Developer {} deactivated", id);
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "Developer deleted successfully",
    ))))
}
