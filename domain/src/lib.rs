//! Domain layer for roundtable
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Speaking weight
//!
//! Every persona gets a deterministic [0, 1] "should-speak-now" score from
//! its configuration, the current discussion context, and the recent-speaker
//! history. The [`SpeakerScheduler`] picks the roster maximum each turn.
//!
//! ## Modes
//!
//! - **Interview**: paired interviewer/interviewee exchanges, detected from
//!   the meeting topic
//! - **Discussion**: open round-robin, up to two turns per round
//!
//! ## Events
//!
//! Everything observers see is a [`ConversationEvent`] — a timestamped,
//! tagged JSON payload, including the typewriter reveal of each message.

pub mod core;
pub mod meeting;
pub mod message;
pub mod persona;
pub mod scheduler;
pub mod session;
pub mod stream;

// Re-export commonly used types
pub use core::error::DomainError;
pub use meeting::{
    entities::{DiscussionConfig, Meeting, MeetingId, MeetingRules, MeetingStatus},
    mode::{ConversationMode, InterviewCast, is_interviewer},
};
pub use message::{Message, MessageId, MessageKind, MessageMetadata};
pub use persona::{
    entities::{Participant, Persona, PersonaId},
    profile::{
        AgreementTendency, BehaviorSettings, DecisionStyle, DetailPreference,
        PersonaProfile, PersonalityTraits, Preference, SentenceLength, SpeakingStyle,
    },
    scoring::speaking_weight,
};
pub use scheduler::{PersonaActivity, SchedulerStats, ScoredSpeaker, SpeakerScheduler};
pub use session::{
    ANTI_REPEAT_WINDOW, RECENT_SPEAKER_WINDOW, SessionState, SessionStatus,
};
pub use stream::{
    event::{ConversationEvent, EventKind},
    typewriter,
    typewriter::{DEFAULT_CHAR_DELAY, TypewriterPacing, TypingChunk},
};
