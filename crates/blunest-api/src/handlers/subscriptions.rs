use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use blunest_db::entities::{
    subscription_plan::{self, FREE_PLAN_SLUG},
    user_subscription::{self, SubscriptionStatus},
};
use blunest_integrations::CreateSubscription;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{
    ApiResponse, CheckoutOptions, CheckoutPrefill, CheckoutTheme, CreateSubscriptionRequest,
    CreateSubscriptionResponse, ErrorResponse, Plan, SubscriptionOverview, UsageSummary,
};
use crate::services::plans;
use crate::AppState;

/// Shared-cache policy for the public plan list
pub const PLANS_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// Name shown in the checkout widget
const CHECKOUT_NAME: &str = "BluNest Real Estate";

/// Accent color of the checkout widget
const CHECKOUT_COLOR: &str = "#f97316";

/// List active subscription plans
#[utoipa::path(
    get,
    path = "/api/subscriptions/plans",
    responses(
        (status = 200, description = "Active plans by display order", body = [Plan]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn list_plans(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let plans = match state.plans_cache.get().await {
        Some(plans) => {
            debug!("Serving {} plans from cache", plans.len());
            plans
        }
        None => {
            let plans: Vec<Plan> = subscription_plan::Entity::find()
                .filter(subscription_plan::Column::IsActive.eq(true))
                .order_by_asc(subscription_plan::Column::DisplayOrder)
                .all(&state.db)
                .await?
                .into_iter()
                .map(Plan::from)
                .collect();

            state.plans_cache.set(plans.clone()).await;
            plans
        }
    };

    Ok((
        [(header::CACHE_CONTROL, PLANS_CACHE_CONTROL)],
        Json(ApiResponse::new(plans)),
    ))
}

/// Current subscription, plan and monthly usage
#[utoipa::path(
    get,
    path = "/api/subscriptions",
    responses(
        (status = 200, description = "Subscription overview", body = SubscriptionOverview),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<SubscriptionOverview>>> {
    let current = plans::current_plan(&state.db, user.user_id).await?;
    let analyses_used = plans::analyses_this_month(&state.db, user.user_id).await?;

    let usage = UsageSummary {
        analyses_used,
        analyses_limit: current.plan.analyses_per_month,
        // Comparison lists are not tracked server side
        properties_in_comparison: 0,
        properties_limit: current.plan.max_properties_comparison,
        can_analyze: plans::within_limit(&current.plan, analyses_used),
    };

    Ok(Json(ApiResponse::new(SubscriptionOverview {
        subscription: current.subscription.map(Into::into),
        plan: current.plan.into(),
        usage,
    })))
}

/// Start a paid subscription through the payment gateway
#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created; complete payment with the checkout options", body = CreateSubscriptionResponse),
        (status = 400, description = "Missing slug, free plan or already subscribed", body = ErrorResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse),
        (status = 500, description = "Gateway plan not configured", body = ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreateSubscriptionResponse>>)> {
    let plan_slug = req
        .plan_slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Plan slug is required").with_code("MISSING_PLAN"))?;

    let plan = subscription_plan::Entity::find()
        .filter(subscription_plan::Column::Slug.eq(plan_slug))
        .filter(subscription_plan::Column::IsActive.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Plan not found").with_code("PLAN_NOT_FOUND"))?;

    if plan.slug == FREE_PLAN_SLUG {
        return Err(ApiError::bad_request("Cannot subscribe to free plan").with_code("FREE_PLAN"));
    }

    if plans::find_active_subscription(&state.db, user.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(
            "You already have an active subscription. Please cancel it first.",
        )
        .with_code("SUBSCRIPTION_EXISTS"));
    }

    let gateway_plan_id = state
        .config
        .gateway_plan_ids
        .get(&plan.slug)
        .cloned()
        .ok_or_else(|| {
            ApiError::Config(format!(
                "Razorpay plan id for '{}' is not configured (RAZORPAY_PLAN_{})",
                plan.slug,
                plan.slug.to_uppercase()
            ))
        })?;

    let gateway = state
        .payments
        .create_subscription(
            &CreateSubscription::new(gateway_plan_id.clone())
                .with_note("user_id", user.user_id.to_string())
                .with_note("plan_slug", plan.slug.clone())
                .with_note("plan_name", plan.name.clone()),
        )
        .await?;

    let now = Utc::now();
    let row = user_subscription::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        plan_id: Set(plan.id),
        status: Set(SubscriptionStatus::Created),
        gateway_subscription_id: Set(Some(gateway.id.clone())),
        gateway_plan_id: Set(Some(gateway_plan_id)),
        current_period_start: Set(None),
        current_period_end: Set(None),
        cancel_at_period_end: Set(false),
        cancelled_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!(
        "Subscription {} created for user {} on plan {} (gateway {})",
        row.id, user.user_id, plan.slug, gateway.id
    );

    let checkout = CheckoutOptions {
        key: state.config.razorpay_key_id.clone(),
        subscription_id: gateway.id,
        name: CHECKOUT_NAME.to_string(),
        description: format!("{} - Monthly Subscription", plan.name),
        prefill: CheckoutPrefill {
            name: user.full_name.clone().unwrap_or_default(),
            email: user.email.clone(),
            contact: user.phone.clone().unwrap_or_default(),
        },
        theme: CheckoutTheme {
            color: CHECKOUT_COLOR.to_string(),
        },
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CreateSubscriptionResponse {
            subscription: row.into(),
            razorpay: checkout,
        })),
    ))
}
