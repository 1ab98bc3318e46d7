//! Reply generator port
//!
//! Defines the interface to the external text-generation service (an LLM
//! call with its own retry/timeout policy). Generation failure is never
//! fatal to a conversation: the loop converts a hard error into locally
//! templated fallback content, and every reply carries an explicit
//! provenance so callers can tell the two apart.

use async_trait::async_trait;
use roundtable_domain::{
    ConversationMode, Message, MessageKind, MessageMetadata, Persona,
};
use thiserror::Error;

/// Errors that can occur during reply generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator is not configured")]
    Unconfigured,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// The conversational stance of the persona taking this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleType {
    Interviewer,
    Interviewee,
    Participant,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Interviewer => "interviewer",
            RoleType::Interviewee => "interviewee",
            RoleType::Participant => "participant",
        }
    }
}

/// Everything a generator adapter needs to produce one turn.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    pub persona: Persona,
    pub mode: ConversationMode,
    pub role_type: RoleType,
    /// The counterpart in an interview exchange, if any.
    pub target: Option<Persona>,
    pub meeting_title: String,
    pub topic: String,
    /// Assembled discussion context (topic, framing, recent excerpts).
    pub context: String,
    /// Recent conversation history, oldest first.
    pub history: Vec<Message>,
    /// Messages produced so far in this session; drives template cycling.
    pub exchange_index: u32,
}

/// Where a reply's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyProvenance {
    /// Produced by the external generator.
    Generated,
    /// Locally templated fallback after a generation failure.
    Fallback,
}

/// A produced turn, not yet persisted.
#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub content: String,
    pub kind: MessageKind,
    pub metadata: MessageMetadata,
    pub provenance: ReplyProvenance,
}

/// Port to the external text-generation service.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Produce one turn for the requesting persona.
    async fn generate(&self, request: &ReplyRequest) -> Result<GeneratedReply, GeneratorError>;
}
