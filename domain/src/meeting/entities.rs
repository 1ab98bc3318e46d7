//! Meeting entities and rule configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a meeting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MeetingId(pub i64);

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a meeting record.
///
/// This is the stored record's status, distinct from the runtime
/// [`SessionStatus`](crate::session::SessionStatus) of an active
/// conversation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Draft,
    Scheduled,
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// Rules governing one meeting's conversation loop.
///
/// All fields have documented defaults so a meeting created with an empty
/// rules object behaves sensibly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingRules {
    /// Turns a persona may take before the over-speaking penalty applies.
    pub max_consecutive_turns: u32,
    /// Number of complete exchanges (question+answer pairs) to run.
    pub discussion_rounds: Option<u32>,
    /// Hard cap on messages produced by the loop.
    pub max_messages: u32,
    /// Per-turn speaking time budget in seconds; drives the pacing sleep.
    pub speaking_time_limit: Option<u64>,
    /// Generate a closing meeting summary when the loop ends.
    pub auto_summarize: bool,
}

impl Default for MeetingRules {
    fn default() -> Self {
        Self {
            max_consecutive_turns: 2,
            discussion_rounds: None,
            max_messages: 1000,
            speaking_time_limit: None,
            auto_summarize: true,
        }
    }
}

/// Discussion framing shown to the generator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscussionConfig {
    pub discussion_topic: String,
    pub context_description: Option<String>,
    pub expected_outcomes: Vec<String>,
    pub discussion_style: Option<String>,
}

/// A meeting record (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    pub description: Option<String>,
    /// Topic and agenda; scanned for interview-mode keywords.
    pub topic: String,
    pub status: MeetingStatus,
    /// Wall-clock limit for the conversation loop, in minutes.
    pub duration_limit: Option<u64>,
    pub rules: MeetingRules,
    pub discussion: DiscussionConfig,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(id: MeetingId, title: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            topic: topic.into(),
            status: MeetingStatus::Active,
            duration_limit: None,
            rules: MeetingRules::default(),
            discussion: DiscussionConfig::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_rules(mut self, rules: MeetingRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_discussion(mut self, discussion: DiscussionConfig) -> Self {
        self.discussion = discussion;
        self
    }

    pub fn with_duration_limit(mut self, minutes: u64) -> Self {
        self.duration_limit = Some(minutes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_defaults() {
        let rules = MeetingRules::default();
        assert_eq!(rules.max_consecutive_turns, 2);
        assert_eq!(rules.max_messages, 1000);
        assert!(rules.discussion_rounds.is_none());
        assert!(rules.auto_summarize);
    }

    #[test]
    fn empty_rules_object_deserializes_to_defaults() {
        let rules: MeetingRules = serde_json::from_str("{}").unwrap();
        assert_eq!(rules, MeetingRules::default());
    }
}
