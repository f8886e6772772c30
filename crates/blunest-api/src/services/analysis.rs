//! Multi-agent property analysis
//!
//! Each enabled agent is a system prompt run against the same property
//! context. Agents run concurrently and fail independently; the synthesis is a
//! keyword heuristic over the texts that came back.

use std::collections::BTreeMap;

use blunest_db::entities::{ai_agent_configuration, property};
use blunest_integrations::{GenerationRequest, LanguageModel};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

const POSITIVE_WORDS: &[&str] = &[
    "excellent",
    "good",
    "strong",
    "positive",
    "recommended",
    "buy",
    "growth",
    "potential",
];

const NEGATIVE_WORDS: &[&str] = &[
    "poor", "weak", "negative", "avoid", "risk", "concern", "delay", "issue",
];

/// Neutral score, used as the starting point and when nothing succeeded
pub const NEUTRAL_SCORE: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Avoid,
}

impl Recommendation {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 75 => Self::StrongBuy,
            s if s >= 60 => Self::Buy,
            s if s < 40 => Self::Avoid,
            _ => Self::Hold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAnalysis {
    pub analysis: String,
    #[serde(rename = "tokensUsed")]
    pub tokens_used: i64,
    pub model: String,
    #[serde(rename = "agentName")]
    pub agent_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentFailure {
    pub error: String,
    pub message: String,
}

/// Result of one agent; failures are kept so the client can show them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentOutcome {
    Success(AgentAnalysis),
    Failed(AgentFailure),
}

impl AgentOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self::Failed(AgentFailure {
            error: "Analysis failed".to_string(),
            message: message.into(),
        })
    }

    pub fn tokens_used(&self) -> i64 {
        match self {
            Self::Success(a) => a.tokens_used,
            Self::Failed(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synthesis {
    pub overall_score: i32,
    pub recommendation: Recommendation,
    /// Share of agents that produced a result, 0.0 to 1.0
    pub confidence_level: f64,
}

/// Per-agent outcomes keyed by slug, with the synthesis alongside
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub agents: BTreeMap<String, AgentOutcome>,
    #[serde(flatten)]
    pub synthesis: Synthesis,
}

/// 50, +5 per positive keyword present, -5 per negative one, clamped to 0..=100
pub fn score_text(text: &str) -> i32 {
    let lower = text.to_lowercase();
    let positives = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count() as i32;
    let negatives = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count() as i32;

    (NEUTRAL_SCORE + 5 * positives - 5 * negatives).clamp(0, 100)
}

pub fn synthesize(outcomes: &BTreeMap<String, AgentOutcome>) -> Synthesis {
    let scores: Vec<i32> = outcomes
        .values()
        .filter_map(|o| match o {
            AgentOutcome::Success(a) => Some(score_text(&a.analysis)),
            AgentOutcome::Failed(_) => None,
        })
        .collect();

    let overall_score = if scores.is_empty() {
        NEUTRAL_SCORE
    } else {
        (scores.iter().sum::<i32>() as f64 / scores.len() as f64).round() as i32
    };

    let confidence_level = if outcomes.is_empty() {
        0.0
    } else {
        scores.len() as f64 / outcomes.len() as f64
    };

    Synthesis {
        overall_score,
        recommendation: Recommendation::from_score(overall_score),
        confidence_level,
    }
}

/// Prompt body describing the property to every agent
pub fn property_context(property: &property::Model) -> String {
    let amenities =
        serde_json::to_string(&property.amenities).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Analyze this property:\n\
         Title: {}\n\
         Location: {}\n\
         Price: ₹{}\n\
         Size: {} sqft\n\
         Type: {}\n\
         Bedrooms: {}\n\
         Bathrooms: {}\n\
         Status: {:?}\n\
         Description: {}\n\
         Amenities: {}",
        property.title,
        property.location,
        property.price,
        property.area_sqft,
        property.property_type,
        property.bedrooms,
        property.bathrooms,
        property.status,
        property.description,
        amenities,
    )
}

/// Run every agent concurrently against `context`
pub async fn run_agents(
    llm: &dyn LanguageModel,
    agents: &[ai_agent_configuration::Model],
    context: &str,
) -> BTreeMap<String, AgentOutcome> {
    let runs = agents.iter().map(|agent| async move {
        let request = GenerationRequest {
            model: agent.model.clone(),
            system_prompt: agent.system_prompt.clone(),
            user_prompt: context.to_string(),
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
        };

        let outcome = match llm.generate(&request).await {
            Ok(generation) => {
                debug!(
                    "Agent {} finished with {} tokens on {}",
                    agent.agent_slug, generation.tokens_used, generation.model
                );
                AgentOutcome::Success(AgentAnalysis {
                    analysis: generation.text,
                    tokens_used: generation.tokens_used,
                    model: generation.model,
                    agent_name: agent.display_name.clone(),
                })
            }
            Err(e) => {
                warn!("Agent {} failed: {}", agent.agent_slug, e);
                AgentOutcome::failed(e.to_string())
            }
        };

        (agent.agent_slug.clone(), outcome)
    });

    join_all(runs).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blunest_integrations::{Generation, IntegrationError, MockLanguageModel};
    use chrono::Utc;
    use uuid::Uuid;

    fn success(text: &str) -> AgentOutcome {
        AgentOutcome::Success(AgentAnalysis {
            analysis: text.to_string(),
            tokens_used: 10,
            model: "gemini-1.5-flash".to_string(),
            agent_name: "Agent".to_string(),
        })
    }

    fn agent(slug: &str, prompt: &str) -> ai_agent_configuration::Model {
        ai_agent_configuration::Model {
            id: Uuid::new_v4(),
            agent_slug: slug.to_string(),
            display_name: slug.to_uppercase(),
            description: None,
            system_prompt: prompt.to_string(),
            model: "default".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            required_tier: "free".to_string(),
            display_order: 0,
            is_enabled: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_score_text() {
        assert_eq!(score_text("Nothing notable here."), 50);
        // good + strong + growth + potential
        assert_eq!(score_text("Good location, STRONG growth potential"), 70);
        // risk + delay + concern - buy
        assert_eq!(score_text("Risk of delay is a concern; still a buy"), 40);
        // Substring match: "goodwill" contains "good"
        assert_eq!(score_text("goodwill"), 55);
    }

    #[test]
    fn test_score_bounds() {
        let glowing = POSITIVE_WORDS.join(" ").repeat(3);
        assert_eq!(score_text(&glowing), 90);
        let grim = NEGATIVE_WORDS.join(" ");
        assert_eq!(score_text(&grim), 10);
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_score(75), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(74), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(60), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(59), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(40), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(39), Recommendation::Avoid);
    }

    #[test]
    fn test_synthesize_skips_failures() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("a".to_string(), success("excellent strong growth")); // 65
        outcomes.insert("b".to_string(), success("good")); // 55
        outcomes.insert("c".to_string(), AgentOutcome::failed("timeout"));

        let synthesis = synthesize(&outcomes);
        assert_eq!(synthesis.overall_score, 60);
        assert_eq!(synthesis.recommendation, Recommendation::Buy);
        assert!((synthesis.confidence_level - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_synthesize_all_failed() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("a".to_string(), AgentOutcome::failed("boom"));

        let synthesis = synthesize(&outcomes);
        assert_eq!(synthesis.overall_score, NEUTRAL_SCORE);
        assert_eq!(synthesis.recommendation, Recommendation::Hold);
        assert_eq!(synthesis.confidence_level, 0.0);
    }

    #[test]
    fn test_report_serialization() {
        let mut agents = BTreeMap::new();
        agents.insert("market_pulse".to_string(), success("good"));
        agents.insert("deal_underwriter".to_string(), AgentOutcome::failed("quota"));
        let synthesis = synthesize(&agents);
        let report = AnalysisReport { agents, synthesis };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["market_pulse"]["tokensUsed"], 10);
        assert_eq!(json["market_pulse"]["agentName"], "Agent");
        assert_eq!(json["deal_underwriter"]["error"], "Analysis failed");
        assert_eq!(json["deal_underwriter"]["message"], "quota");
        assert_eq!(json["overall_score"], 55);
        assert_eq!(json["recommendation"], "HOLD");
        assert_eq!(json["confidence_level"], 0.5);
    }

    #[tokio::test]
    async fn test_run_agents_captures_failures_per_agent() {
        let mut llm = MockLanguageModel::new();
        llm.expect_generate().times(2).returning(|request| {
            if request.system_prompt.contains("legal") {
                Err(IntegrationError::NotConfigured("Gemini API key"))
            } else {
                Ok(Generation {
                    text: format!("Strong demand. {}", request.user_prompt),
                    model: "gemini-1.5-pro".to_string(),
                    tokens_used: 21,
                })
            }
        });

        let agents = vec![
            agent("market_pulse", "You are a market analyst"),
            agent("legal_regulatory", "You are a legal reviewer"),
        ];
        let outcomes = run_agents(&llm, &agents, "Flat in Pune").await;

        assert_eq!(outcomes.len(), 2);
        match &outcomes["market_pulse"] {
            AgentOutcome::Success(a) => {
                assert_eq!(a.tokens_used, 21);
                assert_eq!(a.agent_name, "MARKET_PULSE");
                assert!(a.analysis.ends_with("Flat in Pune"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(
            outcomes["legal_regulatory"],
            AgentOutcome::Failed(_)
        ));
    }
}
