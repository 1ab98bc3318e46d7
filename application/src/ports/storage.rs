//! Meeting store port
//!
//! Defines how the conversation loop reads meeting/persona records and
//! appends messages. The storage engine itself (and its query API) is an
//! external collaborator; only this contract matters to the core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_domain::{
    Meeting, MeetingId, Message, MessageKind, MessageMetadata, Participant, Persona,
    PersonaId,
};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Content to persist; the store assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub meeting_id: MeetingId,
    /// `None` for system-produced content (summaries).
    pub persona_id: Option<PersonaId>,
    pub content: String,
    pub kind: MessageKind,
    pub metadata: MessageMetadata,
}

/// Persistence port for meetings, personas, and messages.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    async fn get_meeting(&self, meeting_id: MeetingId) -> Result<Meeting, StorageError>;

    async fn get_participants(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Vec<Participant>, StorageError>;

    async fn get_persona(&self, persona_id: PersonaId) -> Result<Persona, StorageError>;

    /// Append a message; messages are immutable once persisted.
    async fn append_message(&self, message: NewMessage) -> Result<Message, StorageError>;

    /// The most recent `limit` messages, oldest first.
    async fn recent_messages(
        &self,
        meeting_id: MeetingId,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError>;

    /// Update the per-meeting activity counters of a participant.
    async fn update_participant_stats(
        &self,
        meeting_id: MeetingId,
        persona_id: PersonaId,
        response_count: u32,
        last_response_time: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}
