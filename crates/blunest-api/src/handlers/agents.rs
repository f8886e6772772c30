use axum::{
    extract::{Path, State},
    Extension, Json,
};
use blunest_db::entities::ai_agent_configuration;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminUser;
use crate::models::{AgentConfig, ApiResponse, ErrorResponse, UpdateAgentRequest};
use crate::AppState;

/// List analysis agent configurations (admin)
#[utoipa::path(
    get,
    path = "/api/admin/ai-agents",
    responses(
        (status = 200, description = "Agents in display order", body = [AgentConfig]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<AgentConfig>>>> {
    let agents = ai_agent_configuration::Entity::find()
        .order_by_asc(ai_agent_configuration::Column::DisplayOrder)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        agents.into_iter().map(AgentConfig::from).collect(),
    )))
}

/// Update an agent's prompt, model or limits (admin)
///
/// Every successful update increments `version`.
#[utoipa::path(
    put,
    path = "/api/admin/ai-agents/{slug}",
    params(
        ("slug" = String, Path, description = "Agent slug")
    ),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated", body = AgentConfig),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_agent(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(slug): Path<String>,
    Json(req): Json<UpdateAgentRequest>,
) -> ApiResult<Json<ApiResponse<AgentConfig>>> {
    req.validate()?;

    let existing = ai_agent_configuration::Entity::find()
        .filter(ai_agent_configuration::Column::AgentSlug.eq(slug.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent not found").with_code("AGENT_NOT_FOUND"))?;

    let version = existing.version + 1;
    let mut active: ai_agent_configuration::ActiveModel = existing.into();

    if let Some(display_name) = req.display_name {
        active.display_name = Set(display_name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description).filter(|d| !d.is_empty()));
    }
    if let Some(system_prompt) = req.system_prompt {
        active.system_prompt = Set(system_prompt);
    }
    if let Some(model) = req.model {
        active.model = Set(model);
    }
    if let Some(temperature) = req.temperature {
        active.temperature = Set(temperature);
    }
    if let Some(max_tokens) = req.max_tokens {
        active.max_tokens = Set(max_tokens);
    }
    if let Some(is_enabled) = req.is_enabled {
        active.is_enabled = Set(is_enabled);
    }
    active.version = Set(version);
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;

    info!(
        "Agent {} updated to version {} by {}",
        updated.agent_slug, updated.version, admin.user_id
    );

    Ok(Json(ApiResponse::new(updated.into())))
}
