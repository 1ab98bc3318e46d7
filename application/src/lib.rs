//! Application layer: orchestration of conversation sessions.
//!
//! This crate drives the domain model: the [`EventBroadcaster`] fans
//! conversation events out to stream subscribers, the conversation loop
//! produces turns through the [`ports`], and the [`SessionManager`] keeps at
//! most one loop alive per meeting. All external collaborators (storage, the
//! text generator, the transcript logger) are reached through ports so the
//! layer stays adapter-free.

pub mod broadcaster;
pub mod fallback;
pub mod ports;
pub mod use_cases;

pub use broadcaster::{EventBroadcaster, SubscriberId, Subscription, HEARTBEAT_INTERVAL};
pub use ports::conversation_logger::{ConversationLogger, LogEvent, NoConversationLogger};
pub use ports::generator::{
    GeneratedReply, GeneratorError, ReplyGenerator, ReplyProvenance, ReplyRequest, RoleType,
};
pub use ports::storage::{MeetingStore, NewMessage, StorageError};
pub use use_cases::run_conversation::{
    ConversationError, ConversationLoop, PacingConfig, SessionCommand, SessionControl,
};
pub use use_cases::session_manager::{SessionError, SessionManager, StartOutcome};
