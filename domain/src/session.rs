//! Runtime session state for one meeting's conversation loop.

use crate::meeting::entities::MeetingId;
use crate::persona::entities::PersonaId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Size of the retained recent-speaker history.
pub const RECENT_SPEAKER_WINDOW: usize = 10;

/// Slice of the history consulted by the anti-repetition penalty.
pub const ANTI_REPEAT_WINDOW: usize = 3;

/// Lifecycle status of a conversation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Initializing,
    Running,
    Paused,
    Stopped,
    Completed,
    Error,
}

impl SessionStatus {
    /// Terminal states: the loop has ended and the registry entry can be
    /// reclaimed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Stopped | SessionStatus::Completed | SessionStatus::Error
        )
    }

    /// States in which a second `start` without force is a no-op.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Running | SessionStatus::Paused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Initializing => "initializing",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable per-meeting loop state (Entity)
///
/// Created on initialization, mutated only by the conversation loop that
/// owns the meeting, destroyed when the loop ends or is force-restarted.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub meeting_id: MeetingId,
    pub status: SessionStatus,
    pub current_round: u32,
    recent_speakers: VecDeque<PersonaId>,
    pub message_count: u32,
    pub started_at: DateTime<Utc>,
    /// Mirrors the loop's pause state; set while `status` is `Paused`.
    pub pause_requested: bool,
}

impl SessionState {
    pub fn new(meeting_id: MeetingId) -> Self {
        Self {
            meeting_id,
            status: SessionStatus::Idle,
            current_round: 0,
            recent_speakers: VecDeque::with_capacity(RECENT_SPEAKER_WINDOW),
            message_count: 0,
            started_at: Utc::now(),
            pause_requested: false,
        }
    }

    /// Update the lifecycle status, keeping the pause flag in sync.
    pub fn transition(&mut self, status: SessionStatus) {
        self.status = status;
        self.pause_requested = status == SessionStatus::Paused;
    }

    /// Record a completed turn, trimming the history to the window size.
    pub fn record_speaker(&mut self, persona_id: PersonaId) {
        self.recent_speakers.push_back(persona_id);
        while self.recent_speakers.len() > RECENT_SPEAKER_WINDOW {
            self.recent_speakers.pop_front();
        }
        self.message_count += 1;
    }

    /// Recent speakers, most-recent-last.
    pub fn recent_speakers(&self) -> Vec<PersonaId> {
        self.recent_speakers.iter().copied().collect()
    }

    /// Advance to the next round. The counter never decreases.
    pub fn begin_round(&mut self) -> u32 {
        self.current_round += 1;
        self.current_round
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }
}
