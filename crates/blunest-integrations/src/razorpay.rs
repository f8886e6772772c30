//! Razorpay subscriptions API client

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{upstream_message, IntegrationError};

const SERVICE: &str = "razorpay";
const DEFAULT_BASE_URL: &str = "https://api.razorpay.com/v1";

/// Billing cycles for a new subscription (monthly plans, one year)
pub const DEFAULT_TOTAL_COUNT: u32 = 12;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateSubscription {
    /// Gateway plan id (`plan_...`)
    pub plan_id: String,
    pub total_count: u32,
    pub quantity: u32,
    /// 1 lets the gateway email the customer
    pub customer_notify: u8,
    pub notes: HashMap<String, String>,
}

impl CreateSubscription {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            total_count: DEFAULT_TOTAL_COUNT,
            quantity: 1,
            customer_notify: 1,
            notes: HashMap::new(),
        }
    }

    pub fn with_note(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }
}

/// Subscription entity as returned by the gateway and embedded in webhooks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewaySubscription {
    pub id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub start_at: Option<i64>,
    #[serde(default)]
    pub end_at: Option<i64>,
    #[serde(default)]
    pub current_start: Option<i64>,
    #[serde(default)]
    pub current_end: Option<i64>,
    #[serde(default)]
    pub short_url: Option<String>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_subscription(
        &self,
        request: &CreateSubscription,
    ) -> Result<GatewaySubscription, IntegrationError>;
}

/// Razorpay REST client using key id / key secret basic auth
pub struct RazorpayClient {
    http: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_subscription(
        &self,
        request: &CreateSubscription,
    ) -> Result<GatewaySubscription, IntegrationError> {
        if self.key_id.is_empty() || self.key_secret.is_empty() {
            return Err(IntegrationError::NotConfigured("Razorpay API key"));
        }

        debug!("Creating gateway subscription for plan {}", request.plan_id);

        let response = self
            .http
            .post(format!("{}/subscriptions", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let subscription: GatewaySubscription = response.json().await?;
        info!("Gateway subscription {} created", subscription.id);
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_subscription_body() {
        let request = CreateSubscription::new("plan_basic")
            .with_note("user_id", "u-1")
            .with_note("plan_slug", "ai_basic");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["plan_id"], "plan_basic");
        assert_eq!(body["total_count"], 12);
        assert_eq!(body["customer_notify"], 1);
        assert_eq!(body["quantity"], 1);
        assert_eq!(body["notes"]["plan_slug"], "ai_basic");
    }

    #[test]
    fn test_parse_webhook_entity() {
        let entity: GatewaySubscription = serde_json::from_value(serde_json::json!({
            "id": "sub_123",
            "entity": "subscription",
            "plan_id": "plan_basic",
            "status": "active",
            "start_at": 1_735_689_600,
            "end_at": 1_767_225_600,
            "current_start": 1_735_689_600,
            "current_end": 1_738_368_000,
            "paid_count": 1
        }))
        .unwrap();

        assert_eq!(entity.id, "sub_123");
        assert_eq!(entity.current_end, Some(1_738_368_000));
        assert_eq!(entity.short_url, None);
    }

    #[tokio::test]
    async fn test_missing_keys_is_config_error() {
        let client = RazorpayClient::new("", "");
        let result = client
            .create_subscription(&CreateSubscription::new("plan_x"))
            .await;
        assert!(matches!(result, Err(IntegrationError::NotConfigured(_))));
    }
}
