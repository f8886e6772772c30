//! Google Gemini text generation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{upstream_message, IntegrationError};

const SERVICE: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Used when the model list is unavailable or has no preferred model
pub const FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Retried once when the chosen model returns 404
pub const LEGACY_MODEL: &str = "gemini-pro";

/// Preference order when picking a model automatically
const PRIORITY_MODELS: &[&str] = &[
    "gemini-3.0-pro-preview",
    "gemini-2.5-pro",
    "gemini-2.0-flash-exp",
    "gemini-2.0-pro-exp",
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash-001",
    "gemini-1.5-pro",
    "gemini-1.5-pro-latest",
    "gemini-1.5-pro-001",
    "gemini-pro",
    "gemini-1.0-pro",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Model name; blank or `default` picks the best available model
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub max_tokens: i32,
}

impl GenerationRequest {
    /// Single-turn prompt with the system prompt prepended
    pub fn prompt(&self) -> String {
        format!("System: {}\n\nUser: {}", self.system_prompt, self.user_prompt)
    }

    fn wants_auto_model(&self) -> bool {
        let model = self.model.trim();
        model.is_empty() || model == "default"
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Model that produced the text
    pub model: String,
    pub tokens_used: i64,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, IntegrationError>;
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Qualified name, e.g. `models/gemini-1.5-flash`
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

/// Pick the first priority model the provider offers for `generateContent`
pub fn pick_best_model(models: &[ModelInfo]) -> String {
    PRIORITY_MODELS
        .iter()
        .find_map(|wanted| {
            models.iter().find(|m| {
                m.name.ends_with(wanted)
                    && m
                        .supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
            })
        })
        .map(|m| m.name.trim_start_matches("models/").to_string())
        .unwrap_or_else(|| FALLBACK_MODEL.to_string())
}

pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    best_model: OnceCell<String>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            best_model: OnceCell::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, IntegrationError> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IntegrationError::Upstream {
                service: SERVICE,
                status: response.status().as_u16(),
                message: "failed to list models".to_string(),
            });
        }

        Ok(response.json::<ModelList>().await?.models)
    }

    /// Best model, resolved once per client; listing failures are not cached
    async fn resolve_model(&self, request: &GenerationRequest) -> String {
        if !request.wants_auto_model() {
            return request.model.trim().to_string();
        }

        let resolved = self
            .best_model
            .get_or_try_init(|| async {
                let models = self.list_models().await?;
                let best = pick_best_model(&models);
                debug!("Selected model {} from {} available", best, models.len());
                Ok::<_, IntegrationError>(best)
            })
            .await;

        match resolved {
            Ok(model) => model.clone(),
            Err(e) => {
                warn!("Failed to fetch models list, defaulting to {}: {}", FALLBACK_MODEL, e);
                FALLBACK_MODEL.to_string()
            }
        }
    }

    async fn generate_with(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<Generation, IntegrationError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt() }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            }
        });

        let response = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(IntegrationError::NotFound(format!("Model {}", model)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let body: serde_json::Value = response.json().await?;
        parse_generation(&body, model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, IntegrationError> {
        if self.api_key.is_empty() {
            return Err(IntegrationError::NotConfigured("Gemini API key"));
        }

        let model = self.resolve_model(request).await;

        match self.generate_with(&model, request).await {
            Err(IntegrationError::NotFound(_)) if model != LEGACY_MODEL => {
                warn!(
                    "Model {} failed with 404. Retrying with legacy '{}'",
                    model, LEGACY_MODEL
                );
                self.generate_with(LEGACY_MODEL, request).await
            }
            other => other,
        }
    }
}

fn parse_generation(body: &serde_json::Value, model: &str) -> Result<Generation, IntegrationError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = body
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates");
            IntegrationError::invalid_response(SERVICE, reason)
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    let tokens_used = body
        .pointer("/usageMetadata/totalTokenCount")
        .and_then(|t| t.as_i64())
        .unwrap_or(0);

    Ok(Generation {
        text,
        model: model.to_string(),
        tokens_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_pick_best_model_priority() {
        let models = vec![
            info("models/gemini-1.0-pro", &["generateContent"]),
            info("models/gemini-1.5-pro", &["generateContent"]),
            info("models/gemini-2.5-pro", &["embedContent"]),
        ];
        assert_eq!(pick_best_model(&models), "gemini-1.5-pro");
    }

    #[test]
    fn test_pick_best_model_fallback() {
        assert_eq!(pick_best_model(&[]), FALLBACK_MODEL);
        let models = vec![info("models/text-bison", &["generateContent"])];
        assert_eq!(pick_best_model(&models), FALLBACK_MODEL);
    }

    #[test]
    fn test_prompt_format() {
        let request = GenerationRequest {
            model: "default".to_string(),
            system_prompt: "Be brief".to_string(),
            user_prompt: "Price?".to_string(),
            temperature: 0.7,
            max_tokens: 100,
        };
        assert_eq!(request.prompt(), "System: Be brief\n\nUser: Price?");
        assert!(request.wants_auto_model());
    }

    #[test]
    fn test_parse_generation() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Strong " }, { "text": "growth." }] }
            }],
            "usageMetadata": { "totalTokenCount": 42 }
        });
        let generation = parse_generation(&body, "gemini-1.5-flash").unwrap();
        assert_eq!(generation.text, "Strong growth.");
        assert_eq!(generation.tokens_used, 42);
    }

    #[test]
    fn test_parse_blocked_generation() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_generation(&body, "gemini-1.5-flash").unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
