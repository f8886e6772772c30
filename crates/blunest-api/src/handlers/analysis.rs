use axum::{extract::State, Extension, Json};
use blunest_db::entities::{
    ai_agent_configuration, ai_property_analysis, property, subscription_usage_log,
    subscription_usage_log::UsageType,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use validator::Validate;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{
    AnalysisMetadata, AnalyzePropertyRequest, AnalyzePropertyResponse, ApiResponse, ChatMessage,
    ChatRequest, ChatResponse, ChatRole, ErrorResponse,
};
use crate::services::analysis::{
    property_context, run_agents, synthesize, AgentOutcome, AnalysisReport,
};
use crate::services::groups::find_property;
use crate::services::{chat, plans};
use crate::AppState;

/// Run the selected analysis agents on a property
#[utoipa::path(
    post,
    path = "/api/ai/analyze-property",
    request_body = AnalyzePropertyRequest,
    responses(
        (status = 200, description = "Per-agent results with synthesis", body = AnalyzePropertyResponse),
        (status = 400, description = "Missing property or agents", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Usage limit reached or agent not in plan", body = ErrorResponse),
        (status = 404, description = "Property or agents not found", body = ErrorResponse)
    ),
    tag = "ai"
)]
pub async fn analyze_property(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AnalyzePropertyRequest>,
) -> ApiResult<Json<ApiResponse<AnalyzePropertyResponse>>> {
    let property_id = req.property_id.ok_or_else(|| {
        ApiError::bad_request("Property ID is required").with_code("MISSING_PROPERTY")
    })?;

    if req.agent_slugs.is_empty() {
        return Err(ApiError::bad_request("At least one agent must be selected")
            .with_code("MISSING_AGENTS"));
    }

    let current = plans::current_plan(&state.db, user.user_id).await?;
    let used = plans::analyses_this_month(&state.db, user.user_id).await?;

    if !plans::within_limit(&current.plan, used) {
        return Err(ApiError::forbidden(format!(
            "Monthly analysis limit reached ({} of {} on the {} plan). Upgrade to run more analyses.",
            used, current.plan.analyses_per_month, current.plan.name
        ))
        .with_code("USAGE_LIMIT_EXCEEDED"));
    }

    let property = property::Entity::find_by_id(property_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found").with_code("PROPERTY_NOT_FOUND"))?;

    let agents = ai_agent_configuration::Entity::find()
        .filter(ai_agent_configuration::Column::AgentSlug.is_in(req.agent_slugs.iter().cloned()))
        .filter(ai_agent_configuration::Column::IsEnabled.eq(true))
        .order_by_asc(ai_agent_configuration::Column::DisplayOrder)
        .all(&state.db)
        .await?;

    if agents.is_empty() {
        return Err(ApiError::not_found("No enabled agents found").with_code("AGENTS_NOT_FOUND"));
    }

    if let Some(agent) = agents
        .iter()
        .find(|a| !current.plan.allows_agent(&a.agent_slug))
    {
        return Err(ApiError::forbidden(format!(
            "{} is not included in your {} plan",
            agent.display_name, current.plan.name
        ))
        .with_code("AGENT_NOT_IN_PLAN"));
    }

    let started = Instant::now();
    let context = property_context(&property);
    let outcomes = run_agents(state.llm.as_ref(), &agents, &context).await;
    let execution_time = started.elapsed().as_secs_f64();

    let tokens_used: i64 = outcomes.values().map(AgentOutcome::tokens_used).sum();
    let agents_used: Vec<String> = outcomes.keys().cloned().collect();
    let synthesis = synthesize(&outcomes);
    let report = AnalysisReport {
        agents: outcomes,
        synthesis,
    };

    let analysis_data = serde_json::to_value(&report)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize analysis: {}", e)))?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    ai_property_analysis::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        property_id: Set(property.id),
        analysis_data: Set(analysis_data),
        agents_used: Set(json!(agents_used)),
        execution_time_seconds: Set(execution_time),
        tokens_used: Set(i32::try_from(tokens_used).unwrap_or(i32::MAX)),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    subscription_usage_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        subscription_id: Set(current.subscription.as_ref().map(|s| s.id)),
        usage_type: Set(UsageType::AiAnalysis),
        property_id: Set(Some(property.id)),
        metadata: Set(json!({
            "agents_used": agents_used,
            "tokens_used": tokens_used,
            "execution_time": execution_time,
        })),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        "Analysis of property {} for user {}: score {} ({:?}), {} agent(s), {} tokens in {:.2}s",
        property.id,
        user.user_id,
        report.synthesis.overall_score,
        report.synthesis.recommendation,
        agents_used.len(),
        tokens_used,
        execution_time
    );

    Ok(Json(ApiResponse::new(AnalyzePropertyResponse {
        analysis: report,
        metadata: AnalysisMetadata {
            execution_time,
            tokens_used,
            agents_used,
        },
    })))
}

/// Ask the master advisor a question, optionally about one property
#[utoipa::path(
    post,
    path = "/api/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Advisor reply", body = ChatResponse),
        (status = 400, description = "Invalid conversation", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 500, description = "Language model unavailable", body = ErrorResponse)
    ),
    tag = "ai"
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ApiResponse<ChatResponse>>> {
    req.validate()?;

    let context = match req.property.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(id_or_slug) => Some(property_context(&find_property(&state.db, id_or_slug).await?)),
        None => None,
    };

    let agents = ai_agent_configuration::Entity::find()
        .filter(ai_agent_configuration::Column::IsEnabled.eq(true))
        .order_by_asc(ai_agent_configuration::Column::DisplayOrder)
        .all(&state.db)
        .await?;

    debug!(
        "Chat for user {} with {} message(s) and {} persona(s)",
        user.user_id,
        req.messages.len(),
        agents.len()
    );

    let reply = chat::reply(state.llm.as_ref(), &agents, context.as_deref(), &req.messages).await?;

    info!(
        "Chat reply for user {}: {} tokens",
        user.user_id, reply.tokens_used
    );

    Ok(Json(ApiResponse::new(ChatResponse {
        message: ChatMessage {
            role: ChatRole::Assistant,
            content: reply.content,
        },
        tokens_used: reply.tokens_used,
    })))
}
