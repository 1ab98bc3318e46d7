//! Speaker scheduling for one session.
//!
//! [`SpeakerScheduler`] holds the roster of personas instantiated for a
//! meeting and selects the next speaker by maximizing the speaking weight.
//! Ties break to the lowest persona id: the roster is a `BTreeMap` iterated
//! in ascending id order and a candidate replaces the current best only on a
//! strictly greater score, which keeps selection reproducible.

use crate::core::error::DomainError;
use crate::meeting::entities::MeetingRules;
use crate::persona::entities::{Participant, Persona, PersonaId};
use crate::persona::scoring::speaking_weight;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

struct RosterEntry {
    persona: Persona,
    participant: Participant,
}

/// A selected speaker with its winning weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredSpeaker {
    pub persona_id: PersonaId,
    pub score: f64,
}

/// Per-persona activity snapshot for observability.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaActivity {
    pub persona_id: PersonaId,
    pub name: String,
    pub role: String,
    pub response_count: u32,
    pub last_response_time: Option<DateTime<Utc>>,
}

/// Aggregate roster statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStats {
    pub total_personas: usize,
    pub active_personas: usize,
    pub total_responses: u32,
    pub average_responses: f64,
    /// Sorted by response count, descending.
    pub personas: Vec<PersonaActivity>,
    pub most_active: Option<PersonaActivity>,
}

/// Roster and next-speaker selection for one session.
#[derive(Default)]
pub struct SpeakerScheduler {
    roster: BTreeMap<PersonaId, RosterEntry>,
}

impl SpeakerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a persona with its participant binding. Re-adding an id replaces
    /// the previous entry.
    pub fn add(&mut self, persona: Persona, participant: Participant) {
        self.roster.insert(
            persona.id,
            RosterEntry {
                persona,
                participant,
            },
        );
    }

    /// Remove a persona from the roster.
    pub fn remove(&mut self, persona_id: PersonaId) -> Result<Persona, DomainError> {
        self.roster
            .remove(&persona_id)
            .map(|entry| entry.persona)
            .ok_or(DomainError::UnknownPersona(persona_id.0))
    }

    pub fn get(&self, persona_id: PersonaId) -> Option<&Persona> {
        self.roster.get(&persona_id).map(|entry| &entry.persona)
    }

    pub fn contains(&self, persona_id: PersonaId) -> bool {
        self.roster.contains_key(&persona_id)
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Personas in ascending id order.
    pub fn personas(&self) -> Vec<Persona> {
        self.roster.values().map(|e| e.persona.clone()).collect()
    }

    /// Record a completed turn for a roster member.
    pub fn record_response(&mut self, persona_id: PersonaId, at: DateTime<Utc>) {
        if let Some(entry) = self.roster.get_mut(&persona_id) {
            entry.persona.record_response(at);
        }
    }

    /// Select the roster member with the maximum speaking weight.
    ///
    /// Returns `None` when the roster is empty. Equal scores resolve to the
    /// lowest persona id.
    pub fn select_next(
        &self,
        context: &str,
        recent_speakers: &[PersonaId],
        rules: &MeetingRules,
    ) -> Option<ScoredSpeaker> {
        let mut best: Option<ScoredSpeaker> = None;

        for (persona_id, entry) in &self.roster {
            let score = speaking_weight(
                &entry.persona,
                entry.participant.speaking_priority,
                context,
                recent_speakers,
                rules,
            );
            match best {
                Some(current) if score <= current.score => {}
                _ => {
                    best = Some(ScoredSpeaker {
                        persona_id: *persona_id,
                        score,
                    });
                }
            }
        }

        best
    }

    /// Aggregate activity statistics across the roster.
    pub fn statistics(&self) -> SchedulerStats {
        let mut personas: Vec<PersonaActivity> = self
            .roster
            .values()
            .map(|entry| PersonaActivity {
                persona_id: entry.persona.id,
                name: entry.persona.name.clone(),
                role: entry.persona.role.clone(),
                response_count: entry.persona.response_count,
                last_response_time: entry.persona.last_response_time,
            })
            .collect();
        personas.sort_by(|a, b| b.response_count.cmp(&a.response_count));

        let total_responses: u32 = personas.iter().map(|p| p.response_count).sum();
        let active_personas = personas.iter().filter(|p| p.response_count > 0).count();
        let average_responses = if personas.is_empty() {
            0.0
        } else {
            f64::from(total_responses) / personas.len() as f64
        };

        SchedulerStats {
            total_personas: personas.len(),
            active_personas,
            total_responses,
            average_responses,
            most_active: personas.first().cloned(),
            personas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::entities::MeetingId;
    use crate::persona::profile::Preference;

    fn add_persona(scheduler: &mut SpeakerScheduler, id: i64, priority: f64) {
        let persona = Persona::new(PersonaId(id), format!("P{id}"), "participant");
        let participant =
            Participant::new(MeetingId(1), PersonaId(id)).with_priority(priority);
        scheduler.add(persona, participant);
    }

    #[test]
    fn empty_roster_selects_none() {
        let scheduler = SpeakerScheduler::new();
        assert!(scheduler
            .select_next("", &[], &MeetingRules::default())
            .is_none());
    }

    #[test]
    fn highest_score_wins() {
        let mut scheduler = SpeakerScheduler::new();
        add_persona(&mut scheduler, 1, 1.0);
        add_persona(&mut scheduler, 2, 1.5);

        let chosen = scheduler
            .select_next("", &[], &MeetingRules::default())
            .unwrap();
        assert_eq!(chosen.persona_id, PersonaId(2));
    }

    #[test]
    fn ties_break_to_lowest_id() {
        let mut scheduler = SpeakerScheduler::new();
        add_persona(&mut scheduler, 9, 1.0);
        add_persona(&mut scheduler, 2, 1.0);
        add_persona(&mut scheduler, 5, 1.0);

        let chosen = scheduler
            .select_next("", &[], &MeetingRules::default())
            .unwrap();
        assert_eq!(chosen.persona_id, PersonaId(2));
    }

    #[test]
    fn recent_speaker_loses_to_fresh_voice() {
        let mut scheduler = SpeakerScheduler::new();
        add_persona(&mut scheduler, 1, 1.0);
        add_persona(&mut scheduler, 2, 1.0);

        let recent = vec![PersonaId(1)];
        let chosen = scheduler
            .select_next("", &recent, &MeetingRules::default())
            .unwrap();
        assert_eq!(chosen.persona_id, PersonaId(2));
    }

    #[test]
    fn remove_unknown_is_an_error() {
        let mut scheduler = SpeakerScheduler::new();
        let err = scheduler.remove(PersonaId(42)).unwrap_err();
        assert!(matches!(err, DomainError::UnknownPersona(42)));
    }

    #[test]
    fn statistics_track_activity() {
        let mut scheduler = SpeakerScheduler::new();
        add_persona(&mut scheduler, 1, 1.0);
        add_persona(&mut scheduler, 2, 1.0);

        let now = Utc::now();
        scheduler.record_response(PersonaId(2), now);
        scheduler.record_response(PersonaId(2), now);
        scheduler.record_response(PersonaId(1), now);

        let stats = scheduler.statistics();
        assert_eq!(stats.total_personas, 2);
        assert_eq!(stats.active_personas, 2);
        assert_eq!(stats.total_responses, 3);
        assert!((stats.average_responses - 1.5).abs() < f64::EPSILON);
        assert_eq!(
            stats.most_active.as_ref().map(|p| p.persona_id),
            Some(PersonaId(2))
        );
    }

    #[test]
    fn high_frequency_persona_outranks_neutral() {
        let mut scheduler = SpeakerScheduler::new();
        add_persona(&mut scheduler, 1, 1.0);

        let mut eager = Persona::new(PersonaId(2), "Eager", "analyst");
        eager.profile.behavior.speaking_frequency = Preference::High;
        scheduler.add(eager, Participant::new(MeetingId(1), PersonaId(2)));

        let chosen = scheduler
            .select_next("", &[], &MeetingRules::default())
            .unwrap();
        assert_eq!(chosen.persona_id, PersonaId(2));
    }
}
