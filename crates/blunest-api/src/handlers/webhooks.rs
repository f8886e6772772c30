//! Razorpay webhook receiver
//!
//! The body is authenticated with the shared webhook secret before it is
//! parsed. Unknown events are acknowledged so the gateway stops retrying.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use blunest_auth::verify_signature;
use blunest_db::entities::user_subscription::{self, SubscriptionStatus};
use blunest_integrations::GatewaySubscription;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, ErrorResponse, WebhookAck};
use crate::notifications::{notify_quietly, NewNotification};
use crate::AppState;

/// Header carrying the hex HMAC-SHA256 of the body
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    subscription: Option<EntityEnvelope<GatewaySubscription>>,
    payment: Option<EntityEnvelope<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct EntityEnvelope<T> {
    entity: T,
}

/// Subscription lifecycle events this service acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriptionEvent {
    Activated,
    Charged,
    Cancelled,
    Completed,
    Paused,
    Resumed,
}

impl SubscriptionEvent {
    fn parse(event: &str) -> Option<Self> {
        match event {
            "subscription.activated" => Some(Self::Activated),
            "subscription.charged" => Some(Self::Charged),
            "subscription.cancelled" => Some(Self::Cancelled),
            "subscription.completed" => Some(Self::Completed),
            "subscription.paused" => Some(Self::Paused),
            "subscription.resumed" => Some(Self::Resumed),
            _ => None,
        }
    }

    fn notification(self, plan: &str) -> (&'static str, String) {
        match self {
            Self::Activated => (
                "Subscription activated",
                format!("Your {} subscription is now active.", plan),
            ),
            Self::Charged => (
                "Subscription renewed",
                format!("Your {} subscription has been renewed.", plan),
            ),
            Self::Cancelled => (
                "Subscription cancelled",
                format!("Your {} subscription has been cancelled.", plan),
            ),
            Self::Completed => (
                "Subscription completed",
                format!("Your {} subscription has completed all billing cycles.", plan),
            ),
            Self::Paused => (
                "Subscription paused",
                format!("Your {} subscription has been paused.", plan),
            ),
            Self::Resumed => (
                "Subscription resumed",
                format!("Your {} subscription has been resumed.", plan),
            ),
        }
    }
}

fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Apply `event` to a subscription row
fn apply_event(
    row: user_subscription::Model,
    event: SubscriptionEvent,
    entity: &GatewaySubscription,
    now: DateTime<Utc>,
) -> user_subscription::ActiveModel {
    let mut active: user_subscription::ActiveModel = row.into();

    match event {
        SubscriptionEvent::Activated => {
            active.status = Set(SubscriptionStatus::Active);
            active.current_period_start = Set(timestamp(entity.start_at.or(entity.current_start)));
            active.current_period_end = Set(timestamp(entity.end_at.or(entity.current_end)));
        }
        SubscriptionEvent::Charged => {
            active.current_period_start = Set(timestamp(entity.current_start));
            active.current_period_end = Set(timestamp(entity.current_end));
        }
        SubscriptionEvent::Cancelled => {
            active.status = Set(SubscriptionStatus::Cancelled);
            active.cancelled_at = Set(Some(now));
        }
        SubscriptionEvent::Completed => {
            active.status = Set(SubscriptionStatus::Expired);
        }
        SubscriptionEvent::Paused => {
            active.status = Set(SubscriptionStatus::Suspended);
        }
        SubscriptionEvent::Resumed => {
            active.status = Set(SubscriptionStatus::Active);
        }
    }

    active.updated_at = Set(now);
    active
}

async fn handle_subscription_event(
    state: &AppState,
    event: SubscriptionEvent,
    entity: &GatewaySubscription,
) -> ApiResult<()> {
    let Some((row, plan)) = user_subscription::Entity::find()
        .filter(user_subscription::Column::GatewaySubscriptionId.eq(entity.id.as_str()))
        .find_also_related(blunest_db::entities::subscription_plan::Entity)
        .one(&state.db)
        .await?
    else {
        warn!("Webhook for unknown gateway subscription {}", entity.id);
        return Ok(());
    };

    let user_id = row.user_id;
    let updated = apply_event(row, event, entity, Utc::now())
        .update(&state.db)
        .await?;

    info!(
        "Subscription {} ({}) now {:?} after {:?}",
        updated.id, entity.id, updated.status, event
    );

    let plan_name = plan.map(|p| p.name).unwrap_or_else(|| "BluNest".to_string());
    let (title, message) = event.notification(&plan_name);
    notify_quietly(
        &state.db,
        &state.notifications,
        NewNotification::new(user_id, "subscription", title, message)
            .with_link("/dashboard/subscription"),
    )
    .await;

    Ok(())
}

/// Receive a Razorpay webhook
#[utoipa::path(
    post,
    path = "/api/webhooks/razorpay",
    request_body(content = String, description = "Raw event JSON signed by the gateway", content_type = "application/json"),
    params(
        ("x-razorpay-signature" = String, Header, description = "Hex HMAC-SHA256 of the body")
    ),
    responses(
        (status = 200, description = "Event received", body = WebhookAck),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid signature", body = ErrorResponse),
        (status = 500, description = "Webhook secret not configured", body = ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn razorpay_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<WebhookAck>>> {
    let secret = state.config.razorpay_webhook_secret.as_bytes();
    if secret.is_empty() {
        return Err(ApiError::Config(
            "Razorpay webhook secret is not configured".to_string(),
        ));
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = verify_signature(secret, &body, signature) {
        warn!("Rejected Razorpay webhook: {}", e);
        return Err(ApiError::unauthorized("Invalid signature").with_code("INVALID_SIGNATURE"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        ApiError::bad_request(format!("Invalid webhook payload: {}", e))
            .with_code("INVALID_PAYLOAD")
    })?;

    debug!("Razorpay webhook: {}", event.event);

    match (SubscriptionEvent::parse(&event.event), &event.payload.subscription) {
        (Some(kind), Some(envelope)) => {
            handle_subscription_event(&state, kind, &envelope.entity).await?;
        }
        (Some(kind), None) => {
            warn!("{:?} webhook without a subscription entity", kind);
        }
        (None, _) if event.event == "payment.failed" => {
            let payment_id = event
                .payload
                .payment
                .as_ref()
                .and_then(|p| p.entity.get("id"))
                .and_then(|id| id.as_str())
                .unwrap_or("unknown");
            warn!("Razorpay payment {} failed", payment_id);
        }
        (None, _) => {
            info!("Ignoring Razorpay event {}", event.event);
        }
    }

    Ok(Json(ApiResponse::new(WebhookAck { received: true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn row() -> user_subscription::Model {
        let now = Utc::now();
        user_subscription::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status: SubscriptionStatus::Created,
            gateway_subscription_id: Some("sub_123".to_string()),
            gateway_plan_id: Some("plan_abc".to_string()),
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entity() -> GatewaySubscription {
        GatewaySubscription {
            id: "sub_123".to_string(),
            plan_id: Some("plan_abc".to_string()),
            status: Some("active".to_string()),
            start_at: Some(1_735_689_600),
            end_at: Some(1_767_225_600),
            current_start: Some(1_738_368_000),
            current_end: Some(1_740_787_200),
            short_url: None,
        }
    }

    #[test]
    fn test_parse_events() {
        assert_eq!(
            SubscriptionEvent::parse("subscription.activated"),
            Some(SubscriptionEvent::Activated)
        );
        assert_eq!(
            SubscriptionEvent::parse("subscription.paused"),
            Some(SubscriptionEvent::Paused)
        );
        assert_eq!(SubscriptionEvent::parse("payment.failed"), None);
        assert_eq!(SubscriptionEvent::parse("order.paid"), None);
    }

    #[test]
    fn test_activated_sets_period() {
        let active = apply_event(row(), SubscriptionEvent::Activated, &entity(), Utc::now());

        assert_eq!(active.status.clone().unwrap(), SubscriptionStatus::Active);
        assert_eq!(
            active.current_period_start.clone().unwrap(),
            DateTime::from_timestamp(1_735_689_600, 0)
        );
        assert_eq!(
            active.current_period_end.clone().unwrap(),
            DateTime::from_timestamp(1_767_225_600, 0)
        );
    }

    #[test]
    fn test_charged_moves_period_only() {
        let active = apply_event(row(), SubscriptionEvent::Charged, &entity(), Utc::now());

        assert_eq!(active.status.clone().unwrap(), SubscriptionStatus::Created);
        assert_eq!(
            active.current_period_start.clone().unwrap(),
            DateTime::from_timestamp(1_738_368_000, 0)
        );
    }

    #[test]
    fn test_status_transitions() {
        let now = Utc::now();
        let cancelled = apply_event(row(), SubscriptionEvent::Cancelled, &entity(), now);
        assert_eq!(cancelled.status.clone().unwrap(), SubscriptionStatus::Cancelled);
        assert_eq!(cancelled.cancelled_at.clone().unwrap(), Some(now));

        let completed = apply_event(row(), SubscriptionEvent::Completed, &entity(), now);
        assert_eq!(completed.status.clone().unwrap(), SubscriptionStatus::Expired);

        let paused = apply_event(row(), SubscriptionEvent::Paused, &entity(), now);
        assert_eq!(paused.status.clone().unwrap(), SubscriptionStatus::Suspended);
    }

    #[test]
    fn test_payload_without_subscription() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"event":"payment.failed","payload":{"payment":{"entity":{"id":"pay_1"}}}}"#,
        )
        .unwrap();
        assert!(event.payload.subscription.is_none());
        assert_eq!(event.payload.payment.unwrap().entity["id"], "pay_1");
    }
}
