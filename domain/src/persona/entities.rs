//! Persona and participant entities

use super::profile::PersonaProfile;
use crate::meeting::entities::MeetingId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a configured persona.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonaId(pub i64);

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A configured AI participant (Entity)
///
/// The identity, profile, and expertise fields are static configuration.
/// `response_count` and `last_response_time` are per-session counters owned
/// by the session that instantiated the persona; personas are never shared
/// mutably across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub name: String,
    pub role: String,
    pub backstory: String,
    pub goal: String,
    pub expertise_areas: Vec<String>,
    pub profile: PersonaProfile,
    #[serde(default)]
    pub response_count: u32,
    #[serde(default)]
    pub last_response_time: Option<DateTime<Utc>>,
}

impl Persona {
    pub fn new(id: PersonaId, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
            backstory: String::new(),
            goal: String::new(),
            expertise_areas: Vec::new(),
            profile: PersonaProfile::default(),
            response_count: 0,
            last_response_time: None,
        }
    }

    pub fn with_expertise(mut self, areas: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expertise_areas = areas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_profile(mut self, profile: PersonaProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Record one completed turn.
    pub fn record_response(&mut self, at: DateTime<Utc>) {
        self.response_count += 1;
        self.last_response_time = Some(at);
    }
}

/// Binding of a persona to one meeting (Entity)
///
/// Unique per (meeting, persona) pair; the store enforces the constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub meeting_id: MeetingId,
    pub persona_id: PersonaId,
    /// Role label within the meeting ("participant", "interviewer", ...).
    pub meeting_role: String,
    /// Multiplier applied to the persona's speaking weight.
    pub speaking_priority: f64,
}

impl Participant {
    pub fn new(meeting_id: MeetingId, persona_id: PersonaId) -> Self {
        Self {
            meeting_id,
            persona_id,
            meeting_role: "participant".to_string(),
            speaking_priority: 1.0,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.meeting_role = role.into();
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.speaking_priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_response_updates_counters() {
        let mut persona = Persona::new(PersonaId(1), "Ada", "CTO");
        assert_eq!(persona.response_count, 0);
        assert!(persona.last_response_time.is_none());

        let now = Utc::now();
        persona.record_response(now);
        assert_eq!(persona.response_count, 1);
        assert_eq!(persona.last_response_time, Some(now));
    }

    #[test]
    fn participant_defaults() {
        let participant = Participant::new(MeetingId(3), PersonaId(1));
        assert_eq!(participant.meeting_role, "participant");
        assert!((participant.speaking_priority - 1.0).abs() < f64::EPSILON);
    }
}
