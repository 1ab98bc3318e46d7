//! Meeting message entities.
//!
//! Messages are append-only: once persisted by the store they are never
//! mutated, only replayed to new subscribers.

use crate::meeting::entities::MeetingId;
use crate::persona::entities::PersonaId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a persisted message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tag of a produced message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Discussion,
    Opening,
    Question,
    Answer,
    Analysis,
    Summary,
    MeetingSummary,
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Discussion => "discussion",
            MessageKind::Opening => "opening",
            MessageKind::Question => "question",
            MessageKind::Answer => "answer",
            MessageKind::Analysis => "analysis",
            MessageKind::Summary => "summary",
            MessageKind::MeetingSummary => "meeting_summary",
            MessageKind::System => "system",
        }
    }
}

/// Free-form metadata attached to a message.
///
/// The named fields are the ones the loop always fills; anything else the
/// generator returns is preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageMetadata {
    pub persona_name: Option<String>,
    pub persona_role: Option<String>,
    /// Generator model name, or "template" for fallback content.
    pub generated_by: Option<String>,
    pub exchange_index: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A produced contribution (Entity, immutable once persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub meeting_id: MeetingId,
    /// `None` for system-produced content such as meeting summaries.
    pub persona_id: Option<PersonaId>,
    pub content: String,
    pub kind: MessageKind,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
