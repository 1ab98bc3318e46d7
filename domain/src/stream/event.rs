//! Typed conversation events.
//!
//! [`ConversationEvent`] is the tagged JSON union delivered, in order, to
//! every stream subscriber of a meeting. Each event carries a UTC timestamp;
//! the payload variants serialize flat with a `type` discriminator so the
//! wire format is one self-describing JSON object per event.

use crate::meeting::entities::MeetingId;
use crate::message::{Message, MessageId, MessageKind, MessageMetadata};
use crate::persona::entities::PersonaId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a conversation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Subscription acknowledged.
    Connected { meeting_id: MeetingId },
    /// Replay of a message persisted before the subscriber attached.
    ExistingMessage {
        meeting_id: MeetingId,
        message: Message,
    },
    /// A message persisted while the subscriber was attached.
    NewMessage {
        meeting_id: MeetingId,
        message: Message,
    },
    /// Typewriter delivery is starting for a persisted message.
    MessageStart {
        meeting_id: MeetingId,
        message_id: MessageId,
        persona_id: Option<PersonaId>,
        persona_name: String,
        message_kind: MessageKind,
    },
    /// Incremental typewriter reveal.
    MessageTyping {
        meeting_id: MeetingId,
        message_id: MessageId,
        persona_id: Option<PersonaId>,
        persona_name: String,
        partial_content: String,
        total_length: usize,
        current_position: usize,
    },
    /// Typewriter delivery finished; carries the full text and metadata.
    MessageComplete {
        meeting_id: MeetingId,
        message_id: MessageId,
        persona_id: Option<PersonaId>,
        persona_name: String,
        final_content: String,
        message_kind: MessageKind,
        metadata: MessageMetadata,
    },
    RoundStarted {
        meeting_id: MeetingId,
        round_number: u32,
        total_rounds: u32,
    },
    /// A force-restart discarded the previous loop.
    ConversationReset { meeting_id: MeetingId },
    ConversationPaused { meeting_id: MeetingId },
    ConversationEnded { meeting_id: MeetingId },
    MeetingError {
        meeting_id: MeetingId,
        detail: String,
    },
    /// Idle keep-alive for long-lived connections.
    Heartbeat,
}

impl EventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::Connected { .. } => "connected",
            EventKind::ExistingMessage { .. } => "existing_message",
            EventKind::NewMessage { .. } => "new_message",
            EventKind::MessageStart { .. } => "message_start",
            EventKind::MessageTyping { .. } => "message_typing",
            EventKind::MessageComplete { .. } => "message_complete",
            EventKind::RoundStarted { .. } => "round_started",
            EventKind::ConversationReset { .. } => "conversation_reset",
            EventKind::ConversationPaused { .. } => "conversation_paused",
            EventKind::ConversationEnded { .. } => "conversation_ended",
            EventKind::MeetingError { .. } => "meeting_error",
            EventKind::Heartbeat => "heartbeat",
        }
    }

    /// Events that carry message content (used by the termination-bound
    /// accounting: a round produces at most two of these).
    pub fn is_message_bearing(&self) -> bool {
        matches!(
            self,
            EventKind::ExistingMessage { .. }
                | EventKind::NewMessage { .. }
                | EventKind::MessageComplete { .. }
        )
    }
}

/// A timestamped conversation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ConversationEvent {
    /// Stamp a payload with the current UTC time.
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    pub fn is_message_bearing(&self) -> bool {
        self.kind.is_message_bearing()
    }
}
