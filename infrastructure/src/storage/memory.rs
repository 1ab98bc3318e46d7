//! In-memory meeting store.
//!
//! Process-local implementation of the [`MeetingStore`] port. Records live
//! in a single `RwLock`-guarded table set; ids are allocated sequentially on
//! insert. Suitable for the CLI runner and tests; a database-backed adapter
//! would implement the same port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_application::ports::storage::{MeetingStore, NewMessage, StorageError};
use roundtable_domain::{
    Meeting, MeetingId, Message, MessageId, Participant, Persona, PersonaId,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    meetings: HashMap<MeetingId, Meeting>,
    personas: HashMap<PersonaId, Persona>,
    participants: HashMap<MeetingId, Vec<Participant>>,
    messages: HashMap<MeetingId, Vec<Message>>,
    next_meeting_id: i64,
    next_persona_id: i64,
    next_message_id: i64,
}

/// In-memory [`MeetingStore`] adapter.
#[derive(Default)]
pub struct InMemoryMeetingStore {
    tables: RwLock<Tables>,
}

impl InMemoryMeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a meeting built from a freshly allocated id.
    pub async fn add_meeting(&self, build: impl FnOnce(MeetingId) -> Meeting) -> Meeting {
        let mut tables = self.tables.write().await;
        tables.next_meeting_id += 1;
        let meeting = build(MeetingId(tables.next_meeting_id));
        tables.meetings.insert(meeting.id, meeting.clone());
        meeting
    }

    /// Insert a persona built from a freshly allocated id.
    pub async fn add_persona(&self, build: impl FnOnce(PersonaId) -> Persona) -> Persona {
        let mut tables = self.tables.write().await;
        tables.next_persona_id += 1;
        let persona = build(PersonaId(tables.next_persona_id));
        tables.personas.insert(persona.id, persona.clone());
        persona
    }

    /// Bind a persona to a meeting.
    ///
    /// Fails with `NotFound` when either record is missing and with
    /// `Conflict` when the pair is already bound.
    pub async fn add_participant(&self, participant: Participant) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.meetings.contains_key(&participant.meeting_id) {
            return Err(StorageError::NotFound(format!(
                "meeting {}",
                participant.meeting_id
            )));
        }
        if !tables.personas.contains_key(&participant.persona_id) {
            return Err(StorageError::NotFound(format!(
                "persona {}",
                participant.persona_id
            )));
        }

        let bindings = tables.participants.entry(participant.meeting_id).or_default();
        if bindings
            .iter()
            .any(|p| p.persona_id == participant.persona_id)
        {
            return Err(StorageError::Conflict(format!(
                "persona {} already participates in meeting {}",
                participant.persona_id, participant.meeting_id
            )));
        }
        bindings.push(participant);
        Ok(())
    }
}

#[async_trait]
impl MeetingStore for InMemoryMeetingStore {
    async fn get_meeting(&self, meeting_id: MeetingId) -> Result<Meeting, StorageError> {
        self.tables
            .read()
            .await
            .meetings
            .get(&meeting_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("meeting {meeting_id}")))
    }

    async fn get_participants(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Vec<Participant>, StorageError> {
        let tables = self.tables.read().await;
        if !tables.meetings.contains_key(&meeting_id) {
            return Err(StorageError::NotFound(format!("meeting {meeting_id}")));
        }
        Ok(tables
            .participants
            .get(&meeting_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_persona(&self, persona_id: PersonaId) -> Result<Persona, StorageError> {
        self.tables
            .read()
            .await
            .personas
            .get(&persona_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("persona {persona_id}")))
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.meetings.contains_key(&message.meeting_id) {
            return Err(StorageError::NotFound(format!(
                "meeting {}",
                message.meeting_id
            )));
        }

        tables.next_message_id += 1;
        let now = Utc::now();
        let stored = Message {
            id: MessageId(tables.next_message_id),
            meeting_id: message.meeting_id,
            persona_id: message.persona_id,
            content: message.content,
            kind: message.kind,
            metadata: message.metadata,
            created_at: now,
            sent_at: Some(now),
        };
        tables
            .messages
            .entry(message.meeting_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn recent_messages(
        &self,
        meeting_id: MeetingId,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError> {
        let tables = self.tables.read().await;
        let Some(messages) = tables.messages.get(&meeting_id) else {
            return Ok(Vec::new());
        };
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn update_participant_stats(
        &self,
        _meeting_id: MeetingId,
        persona_id: PersonaId,
        response_count: u32,
        last_response_time: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let persona = tables
            .personas
            .get_mut(&persona_id)
            .ok_or_else(|| StorageError::NotFound(format!("persona {persona_id}")))?;
        persona.response_count = response_count;
        persona.last_response_time = Some(last_response_time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{MessageKind, MessageMetadata};

    async fn seeded() -> (InMemoryMeetingStore, Meeting, Persona) {
        let store = InMemoryMeetingStore::new();
        let meeting = store
            .add_meeting(|id| Meeting::new(id, "Planning", "Q3 roadmap"))
            .await;
        let persona = store
            .add_persona(|id| Persona::new(id, "Grace", "Architect"))
            .await;
        store
            .add_participant(Participant::new(meeting.id, persona.id))
            .await
            .unwrap();
        (store, meeting, persona)
    }

    fn draft(meeting_id: MeetingId, persona_id: PersonaId, content: &str) -> NewMessage {
        NewMessage {
            meeting_id,
            persona_id: Some(persona_id),
            content: content.to_string(),
            kind: MessageKind::Discussion,
            metadata: MessageMetadata::default(),
        }
    }

    #[tokio::test]
    async fn ids_are_allocated_sequentially() {
        let store = InMemoryMeetingStore::new();
        let a = store.add_meeting(|id| Meeting::new(id, "A", "a")).await;
        let b = store.add_meeting(|id| Meeting::new(id, "B", "b")).await;
        assert_eq!(a.id, MeetingId(1));
        assert_eq!(b.id, MeetingId(2));
    }

    #[tokio::test]
    async fn duplicate_participant_is_a_conflict() {
        let (store, meeting, persona) = seeded().await;
        let err = store
            .add_participant(Participant::new(meeting.id, persona.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(store.get_participants(meeting.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn participant_requires_existing_records() {
        let (store, meeting, _) = seeded().await;
        let err = store
            .add_participant(Participant::new(meeting.id, PersonaId(99)))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn recent_messages_keeps_order_and_honors_limit() {
        let (store, meeting, persona) = seeded().await;
        for content in ["one", "two", "three"] {
            store
                .append_message(draft(meeting.id, persona.id, content))
                .await
                .unwrap();
        }

        let recent = store.recent_messages(meeting.id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "two");
        assert_eq!(recent[1].content, "three");
        assert!(recent[0].id < recent[1].id);
    }

    #[tokio::test]
    async fn appending_to_unknown_meeting_fails() {
        let store = InMemoryMeetingStore::new();
        let err = store
            .append_message(draft(MeetingId(1), PersonaId(1), "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn stats_update_is_visible_on_the_persona() {
        let (store, meeting, persona) = seeded().await;
        let now = Utc::now();
        store
            .update_participant_stats(meeting.id, persona.id, 3, now)
            .await
            .unwrap();

        let loaded = store.get_persona(persona.id).await.unwrap();
        assert_eq!(loaded.response_count, 3);
        assert_eq!(loaded.last_response_time, Some(now));
    }
}
