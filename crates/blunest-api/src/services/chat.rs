//! Conversational advisor that speaks for the whole analysis panel
//!
//! The enabled agents become personas in one system prompt. The language
//! model interface is single-turn, so earlier messages are rendered into the
//! user prompt as a transcript ahead of the question.

use blunest_db::entities::ai_agent_configuration;
use blunest_integrations::{GenerationRequest, LanguageModel};

use crate::error::{ApiError, ApiResult};
use crate::models::{ChatMessage, ChatRole};

/// Resolved by the client to the best available model
pub const CHAT_MODEL: &str = "default";
pub const CHAT_TEMPERATURE: f64 = 0.7;
pub const CHAT_MAX_TOKENS: i32 = 2000;

const GUIDELINES: &str = "Guidelines:\n\
    - Answer as one advisor; draw on whichever specialist perspectives are relevant.\n\
    - Be specific to the property when details are available; otherwise say what you would need to know.\n\
    - Flag legal, financial or structural risks plainly.\n\
    - Keep answers concise and practical. Do not invent facts about the property.";

/// Persona line for one agent: "- Name: first line of its prompt"
fn persona(agent: &ai_agent_configuration::Model) -> String {
    let focus = agent
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| agent.system_prompt.lines().next().unwrap_or_default());
    format!("- {}: {}", agent.display_name, focus.trim())
}

pub fn master_system_prompt(
    agents: &[ai_agent_configuration::Model],
    property_context: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "You are BluNest's master real estate advisor, leading a panel of specialists.\n",
    );

    if !agents.is_empty() {
        prompt.push_str("\nYour panel:\n");
        for agent in agents {
            prompt.push_str(&persona(agent));
            prompt.push('\n');
        }
    }

    match property_context {
        Some(context) => {
            prompt.push_str("\nThe user is asking about this property.\n");
            prompt.push_str(context);
            prompt.push('\n');
        }
        None => prompt.push_str("\nNo specific property is selected.\n"),
    }

    prompt.push('\n');
    prompt.push_str(GUIDELINES);
    prompt
}

/// Transcript of every message but the last, followed by the question
///
/// Fails when the conversation does not end with a user message.
pub fn render_conversation(messages: &[ChatMessage]) -> ApiResult<String> {
    let (question, history) = match messages.split_last() {
        Some((last, history)) if last.role == ChatRole::User => (last, history),
        _ => {
            return Err(ApiError::bad_request("The last message must come from the user")
                .with_code("INVALID_CONVERSATION"))
        }
    };

    if question.content.trim().is_empty() {
        return Err(ApiError::invalid_field("messages", "The question cannot be empty"));
    }

    let mut rendered = String::new();
    if !history.is_empty() {
        rendered.push_str("Conversation so far:\n");
        // The model expects a user turn first
        if history[0].role == ChatRole::Assistant {
            rendered.push_str("User: Hello\n");
        }
        for message in history {
            let speaker = match message.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Advisor",
            };
            rendered.push_str(&format!("{}: {}\n", speaker, message.content.trim()));
        }
        rendered.push('\n');
    }

    rendered.push_str("Question: ");
    rendered.push_str(question.content.trim());
    Ok(rendered)
}

pub struct Reply {
    pub content: String,
    pub tokens_used: i64,
}

pub async fn reply(
    llm: &dyn LanguageModel,
    agents: &[ai_agent_configuration::Model],
    property_context: Option<&str>,
    messages: &[ChatMessage],
) -> ApiResult<Reply> {
    let request = GenerationRequest {
        model: CHAT_MODEL.to_string(),
        system_prompt: master_system_prompt(agents, property_context),
        user_prompt: render_conversation(messages)?,
        temperature: CHAT_TEMPERATURE,
        max_tokens: CHAT_MAX_TOKENS,
    };

    let generation = llm.generate(&request).await?;

    Ok(Reply {
        content: generation.text,
        tokens_used: generation.tokens_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blunest_integrations::{Generation, MockLanguageModel};
    use chrono::Utc;
    use uuid::Uuid;

    fn message(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    fn agent(name: &str, description: Option<&str>, prompt: &str) -> ai_agent_configuration::Model {
        ai_agent_configuration::Model {
            id: Uuid::new_v4(),
            agent_slug: name.to_lowercase().replace(' ', "_"),
            display_name: name.to_string(),
            description: description.map(str::to_string),
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
    fn test_system_prompt_lists_personas_and_property() {
        let agents = vec![
            agent("Market Pulse", Some("Local demand and pricing"), "ignored"),
            agent("Legal Eagle", None, "You check titles.\nSecond line"),
        ];

        let prompt = master_system_prompt(&agents, Some("Title: Sea View 2BHK"));
        assert!(prompt.contains("- Market Pulse: Local demand and pricing"));
        assert!(prompt.contains("- Legal Eagle: You check titles."));
        assert!(!prompt.contains("Second line"));
        assert!(prompt.contains("Title: Sea View 2BHK"));
        assert!(prompt.ends_with(GUIDELINES));

        let general = master_system_prompt(&[], None);
        assert!(general.contains("No specific property is selected."));
        assert!(!general.contains("Your panel:"));
    }

    #[test]
    fn test_render_single_question() {
        let rendered = render_conversation(&[message(ChatRole::User, "  Is it a good buy? ")]).unwrap();
        assert_eq!(rendered, "Question: Is it a good buy?");
    }

    #[test]
    fn test_render_history_starting_with_advisor() {
        let rendered = render_conversation(&[
            message(ChatRole::Assistant, "Hi, ask me anything."),
            message(ChatRole::User, "What about parking?"),
            message(ChatRole::Assistant, "Two covered spots."),
            message(ChatRole::User, "And maintenance?"),
        ])
        .unwrap();

        assert_eq!(
            rendered,
            "Conversation so far:\n\
             User: Hello\n\
             Advisor: Hi, ask me anything.\n\
             User: What about parking?\n\
             Advisor: Two covered spots.\n\
             \n\
             Question: And maintenance?"
        );
    }

    #[test]
    fn test_render_rejects_trailing_advisor_message() {
        let err = render_conversation(&[
            message(ChatRole::User, "Hello"),
            message(ChatRole::Assistant, "Hi"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::BadRequest {
                code: Some("INVALID_CONVERSATION"),
                ..
            }
        ));

        assert!(render_conversation(&[]).is_err());
    }

    #[tokio::test]
    async fn test_reply_uses_default_model() {
        let mut llm = MockLanguageModel::new();
        llm.expect_generate()
            .withf(|request| {
                request.model == CHAT_MODEL
                    && request.system_prompt.contains("master real estate advisor")
                    && request.user_prompt == "Question: Should I negotiate?"
            })
            .times(1)
            .returning(|_| {
                Ok(Generation {
                    text: "Yes, aim for 5% below asking.".to_string(),
                    model: "gemini-1.5-pro".to_string(),
                    tokens_used: 42,
                })
            });

        let reply = reply(
            &llm,
            &[],
            None,
            &[message(ChatRole::User, "Should I negotiate?")],
        )
        .await
        .unwrap();

        assert_eq!(reply.content, "Yes, aim for 5% below asking.");
        assert_eq!(reply.tokens_used, 42);
    }
}
