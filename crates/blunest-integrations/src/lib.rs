//! Clients for the managed services the marketplace depends on
//!
//! Each service sits behind an `async_trait` so handlers can be tested with
//! mocks:
//! - [`identity::IdentityProvider`]: GoTrue-compatible authentication service
//! - [`razorpay::PaymentGateway`]: Razorpay subscriptions
//! - [`gemini::LanguageModel`]: Google Gemini text generation

pub mod error;
pub mod gemini;
pub mod identity;
pub mod razorpay;

pub use error::IntegrationError;
pub use gemini::{GeminiClient, Generation, GenerationRequest, LanguageModel};
pub use identity::{
    AdminCreateUser, AuthSession, GoTrueClient, IdentityProvider, ProviderUser, SignUpOutcome,
    SignUpRequest,
};
pub use razorpay::{CreateSubscription, GatewaySubscription, PaymentGateway, RazorpayClient};

#[cfg(any(test, feature = "mock"))]
pub use gemini::MockLanguageModel;
#[cfg(any(test, feature = "mock"))]
pub use identity::MockIdentityProvider;
#[cfg(any(test, feature = "mock"))]
pub use razorpay::MockPaymentGateway;

/// Extract a human readable message from an upstream JSON error body
pub(crate) fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            [
                "/error_description",
                "/msg",
                "/message",
                "/error/description",
                "/error/message",
                "/error",
            ]
            .iter()
            .find_map(|ptr| v.pointer(ptr).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message() {
        assert_eq!(
            upstream_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            upstream_message(r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The id provided does not exist"}}"#),
            "The id provided does not exist"
        );
        assert_eq!(upstream_message("gateway timeout"), "gateway timeout");
    }
}
