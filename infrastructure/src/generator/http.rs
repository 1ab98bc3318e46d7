//! Chat-completion generator adapter.
//!
//! Implements the [`ReplyGenerator`] port against an OpenAI-compatible
//! `/chat/completions` endpoint. One request per turn: the persona's profile
//! sets the token budget and sampling temperature, and failures map onto
//! [`GeneratorError`] so the conversation loop can fall back to templates.

use crate::generator::prompt;
use async_trait::async_trait;
use roundtable_application::ports::generator::{
    GeneratedReply, GeneratorError, ReplyGenerator, ReplyProvenance, ReplyRequest, RoleType,
};
use roundtable_domain::{ConversationMode, MessageKind, MessageMetadata};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct HttpGeneratorConfig {
    /// Base URL of the API, e.g. `https://api.deepseek.com/v1`.
    pub base_url: String,
    /// Bearer token; `None` leaves the generator unconfigured.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// [`ReplyGenerator`] adapter over an OpenAI-compatible HTTP API.
pub struct HttpReplyGenerator {
    client: reqwest::Client,
    config: HttpGeneratorConfig,
}

impl HttpReplyGenerator {
    pub fn new(config: HttpGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Message kind implied by the turn's mode and stance.
fn kind_for(mode: ConversationMode, role_type: RoleType) -> MessageKind {
    match (mode, role_type) {
        (ConversationMode::Interview, RoleType::Interviewer) => MessageKind::Question,
        (ConversationMode::Interview, _) => MessageKind::Answer,
        (ConversationMode::Discussion, _) => MessageKind::Discussion,
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate(&self, request: &ReplyRequest) -> Result<GeneratedReply, GeneratorError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GeneratorError::Unconfigured);
        };

        let parts = prompt::build(request);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &parts.system,
                },
                ChatMessage {
                    role: "user",
                    content: &parts.user,
                },
            ],
            max_tokens: request.persona.profile.max_tokens(),
            temperature: request.persona.profile.temperature(),
        };

        debug!(
            persona = %request.persona.name,
            model = %self.config.model,
            "requesting generated turn"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::RequestFailed(format!("HTTP {status}")));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::MalformedResponse(e.to_string()))?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                GeneratorError::MalformedResponse("response carried no content".to_string())
            })?;

        Ok(GeneratedReply {
            content,
            kind: kind_for(request.mode, request.role_type),
            metadata: MessageMetadata {
                persona_name: Some(request.persona.name.clone()),
                persona_role: Some(request.persona.role.clone()),
                generated_by: Some(self.config.model.clone()),
                exchange_index: Some(request.exchange_index),
                ..Default::default()
            },
            provenance: ReplyProvenance::Generated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{Persona, PersonaId};

    #[test]
    fn kinds_follow_mode_and_stance() {
        assert_eq!(
            kind_for(ConversationMode::Interview, RoleType::Interviewer),
            MessageKind::Question
        );
        assert_eq!(
            kind_for(ConversationMode::Interview, RoleType::Interviewee),
            MessageKind::Answer
        );
        assert_eq!(
            kind_for(ConversationMode::Discussion, RoleType::Participant),
            MessageKind::Discussion
        );
    }

    #[test]
    fn response_payload_deserializes() {
        let json = r#"{
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello there."}}
            ],
            "usage": {"total_tokens": 12}
        }"#;
        let payload: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            payload.choices[0].message.content.as_deref(),
            Some("Hello there.")
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_unconfigured() {
        let generator = HttpReplyGenerator::new(HttpGeneratorConfig {
            base_url: "https://api.example.com/v1".to_string(),
            api_key: None,
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let request = ReplyRequest {
            persona: Persona::new(PersonaId(1), "Grace", "CTO"),
            mode: ConversationMode::Discussion,
            role_type: RoleType::Participant,
            target: None,
            meeting_title: "t".to_string(),
            topic: "t".to_string(),
            context: String::new(),
            history: Vec::new(),
            exchange_index: 0,
        };
        assert!(matches!(
            generator.generate(&request).await,
            Err(GeneratorError::Unconfigured)
        ));
    }
}
