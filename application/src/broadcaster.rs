//! Per-meeting event fan-out.
//!
//! [`EventBroadcaster`] multicasts [`ConversationEvent`]s to every
//! subscriber queue registered for a meeting. A queue that cannot accept an
//! event (consumer gone or hopelessly behind) is dropped silently; the
//! conversation loop never sees subscriber failures.
//!
//! Subscribers consume through [`Subscription::next_event`], which yields a
//! heartbeat when nothing arrives within [`HEARTBEAT_INTERVAL`] so
//! long-lived connections stay alive.

use roundtable_domain::{
    ConversationEvent, EventKind, MeetingId, Message, TypewriterPacing, typewriter,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Idle period after which a subscriber receives a heartbeat.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Outbound queue depth per subscriber.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Unique handle for one subscriber queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct SubscriberSlot {
    id: SubscriberId,
    sender: mpsc::Sender<ConversationEvent>,
}

/// One observer's view of a meeting's event stream.
///
/// Dropping the subscription closes the queue; the broadcaster prunes the
/// dead sender on the next publish.
pub struct Subscription {
    id: SubscriberId,
    meeting_id: MeetingId,
    receiver: mpsc::Receiver<ConversationEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn meeting_id(&self) -> MeetingId {
        self.meeting_id
    }

    /// Wait for the next event.
    ///
    /// Yields a `heartbeat` if nothing arrives within
    /// [`HEARTBEAT_INTERVAL`]; returns `None` once the stream is closed and
    /// drained.
    pub async fn next_event(&mut self) -> Option<ConversationEvent> {
        match tokio::time::timeout(HEARTBEAT_INTERVAL, self.receiver.recv()).await {
            Ok(Some(event)) => Some(event),
            Ok(None) => None,
            Err(_) => Some(ConversationEvent::now(EventKind::Heartbeat)),
        }
    }

    /// Receive without the heartbeat timeout (for batch consumers/tests).
    pub async fn recv(&mut self) -> Option<ConversationEvent> {
        self.receiver.recv().await
    }
}

/// Process-wide multicast of conversation events, keyed by meeting.
#[derive(Default)]
pub struct EventBroadcaster {
    subscribers: Mutex<HashMap<MeetingId, Vec<SubscriberSlot>>>,
    next_id: AtomicU64,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber queue for a meeting.
    pub fn subscribe(&self, meeting_id: MeetingId) -> Subscription {
        self.subscribe_seeded(meeting_id, Vec::new())
    }

    /// Register a new subscriber queue, pre-loaded with `seed` events.
    ///
    /// Used to deliver the `connected` acknowledgment and the replay of
    /// already-persisted messages to just this subscriber before any live
    /// event arrives.
    pub fn subscribe_seeded(
        &self,
        meeting_id: MeetingId,
        seed: Vec<ConversationEvent>,
    ) -> Subscription {
        let capacity = SUBSCRIBER_QUEUE_CAPACITY.max(seed.len() + 16);
        let (sender, receiver) = mpsc::channel(capacity);
        for event in seed {
            // Capacity covers the seed; a failure here means the receiver
            // is already gone, which the next publish cleans up.
            let _ = sender.try_send(event);
        }

        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self.subscribers.lock().expect("subscriber map poisoned");
        let slots = subscribers.entry(meeting_id).or_default();
        slots.push(SubscriberSlot { id, sender });
        debug!(
            meeting_id = meeting_id.0,
            total = slots.len(),
            "subscriber added"
        );

        Subscription {
            id,
            meeting_id,
            receiver,
        }
    }

    /// Remove one subscriber queue explicitly.
    pub fn unsubscribe(&self, meeting_id: MeetingId, subscriber: SubscriberId) {
        let mut subscribers = self.subscribers.lock().expect("subscriber map poisoned");
        if let Some(slots) = subscribers.get_mut(&meeting_id) {
            slots.retain(|slot| slot.id != subscriber);
            if slots.is_empty() {
                subscribers.remove(&meeting_id);
            }
            debug!(meeting_id = meeting_id.0, "subscriber removed");
        }
    }

    /// Push an event onto every queue registered for the meeting.
    ///
    /// Queues that refuse the event are deregistered silently.
    pub fn publish(&self, meeting_id: MeetingId, event: ConversationEvent) {
        let mut subscribers = self.subscribers.lock().expect("subscriber map poisoned");
        let Some(slots) = subscribers.get_mut(&meeting_id) else {
            return;
        };

        slots.retain(|slot| match slot.sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!(
                    meeting_id = meeting_id.0,
                    "dropping unreachable subscriber"
                );
                false
            }
        });

        if slots.is_empty() {
            subscribers.remove(&meeting_id);
        }
    }

    /// Number of live queues for a meeting.
    pub fn subscriber_count(&self, meeting_id: MeetingId) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber map poisoned")
            .get(&meeting_id)
            .map_or(0, Vec::len)
    }

    /// Simulated incremental delivery of an already-persisted message.
    ///
    /// Emits `message_start`, one `message_typing` per accumulated
    /// character (paced by `pacing.char_delay`), and finally
    /// `message_complete` with the full text and metadata. Persistence has
    /// already happened by the time this runs; the reveal is presentation
    /// only.
    pub async fn deliver_typewriter(
        &self,
        message: &Message,
        pacing: TypewriterPacing,
    ) {
        let persona_name = message
            .metadata
            .persona_name
            .clone()
            .unwrap_or_default();

        self.publish(
            message.meeting_id,
            ConversationEvent::now(EventKind::MessageStart {
                meeting_id: message.meeting_id,
                message_id: message.id,
                persona_id: message.persona_id,
                persona_name: persona_name.clone(),
                message_kind: message.kind,
            }),
        );

        for chunk in typewriter::chunks(&message.content) {
            self.publish(
                message.meeting_id,
                ConversationEvent::now(EventKind::MessageTyping {
                    meeting_id: message.meeting_id,
                    message_id: message.id,
                    persona_id: message.persona_id,
                    persona_name: persona_name.clone(),
                    partial_content: chunk.partial_content,
                    total_length: chunk.total_length,
                    current_position: chunk.current_position,
                }),
            );
            if !pacing.char_delay.is_zero() {
                tokio::time::sleep(pacing.char_delay).await;
            }
        }

        self.publish(
            message.meeting_id,
            ConversationEvent::now(EventKind::MessageComplete {
                meeting_id: message.meeting_id,
                message_id: message.id,
                persona_id: message.persona_id,
                persona_name,
                final_content: message.content.clone(),
                message_kind: message.kind,
                metadata: message.metadata.clone(),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roundtable_domain::{MessageId, MessageKind, MessageMetadata, PersonaId};

    fn event(meeting: i64) -> ConversationEvent {
        ConversationEvent::now(EventKind::Connected {
            meeting_id: MeetingId(meeting),
        })
    }

    fn sample_message(content: &str) -> Message {
        Message {
            id: MessageId(1),
            meeting_id: MeetingId(1),
            persona_id: Some(PersonaId(2)),
            content: content.to_string(),
            kind: MessageKind::Question,
            metadata: MessageMetadata {
                persona_name: Some("Grace".to_string()),
                ..Default::default()
            },
            created_at: Utc::now(),
            sent_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn publish_reaches_all_subscribers_of_the_meeting() {
        let broadcaster = EventBroadcaster::new();
        let mut a = broadcaster.subscribe(MeetingId(1));
        let mut b = broadcaster.subscribe(MeetingId(1));
        let mut other = broadcaster.subscribe(MeetingId(2));

        broadcaster.publish(MeetingId(1), event(1));

        assert_eq!(a.recv().await.unwrap().event_type(), "connected");
        assert_eq!(b.recv().await.unwrap().event_type(), "connected");
        assert!(other.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_subscriber_is_pruned_on_publish() {
        let broadcaster = EventBroadcaster::new();
        let sub = broadcaster.subscribe(MeetingId(1));
        assert_eq!(broadcaster.subscriber_count(MeetingId(1)), 1);

        drop(sub);
        broadcaster.publish(MeetingId(1), event(1));
        assert_eq!(broadcaster.subscriber_count(MeetingId(1)), 0);
    }

    #[tokio::test]
    async fn explicit_unsubscribe_removes_queue() {
        let broadcaster = EventBroadcaster::new();
        let sub = broadcaster.subscribe(MeetingId(1));
        broadcaster.unsubscribe(MeetingId(1), sub.id());
        assert_eq!(broadcaster.subscriber_count(MeetingId(1)), 0);
    }

    #[tokio::test]
    async fn seeded_events_arrive_before_live_events() {
        let broadcaster = EventBroadcaster::new();
        let seed = vec![ConversationEvent::now(EventKind::Connected {
            meeting_id: MeetingId(1),
        })];
        let mut sub = broadcaster.subscribe_seeded(MeetingId(1), seed);

        broadcaster.publish(
            MeetingId(1),
            ConversationEvent::now(EventKind::ConversationEnded {
                meeting_id: MeetingId(1),
            }),
        );

        assert_eq!(sub.recv().await.unwrap().event_type(), "connected");
        assert_eq!(sub.recv().await.unwrap().event_type(), "conversation_ended");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_subscriber_gets_heartbeat_within_interval() {
        let broadcaster = EventBroadcaster::new();
        let mut sub = broadcaster.subscribe(MeetingId(1));

        let started = tokio::time::Instant::now();
        let event = sub.next_event().await.unwrap();
        assert_eq!(event.event_type(), "heartbeat");
        assert!(started.elapsed() >= HEARTBEAT_INTERVAL);
        assert!(started.elapsed() < HEARTBEAT_INTERVAL + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn typewriter_emits_start_typing_complete() {
        let broadcaster = EventBroadcaster::new();
        let mut sub = broadcaster.subscribe(MeetingId(1));
        let message = sample_message("hi");

        broadcaster
            .deliver_typewriter(&message, TypewriterPacing::immediate())
            .await;

        let start = sub.recv().await.unwrap();
        assert_eq!(start.event_type(), "message_start");

        let first = sub.recv().await.unwrap();
        match first.kind {
            EventKind::MessageTyping {
                partial_content,
                current_position,
                total_length,
                ..
            } => {
                assert_eq!(partial_content, "h");
                assert_eq!(current_position, 1);
                assert_eq!(total_length, 2);
            }
            other => panic!("expected message_typing, got {other:?}"),
        }

        let second = sub.recv().await.unwrap();
        assert_eq!(second.event_type(), "message_typing");

        let complete = sub.recv().await.unwrap();
        match complete.kind {
            EventKind::MessageComplete {
                final_content,
                persona_name,
                ..
            } => {
                assert_eq!(final_content, "hi");
                assert_eq!(persona_name, "Grace");
            }
            other => panic!("expected message_complete, got {other:?}"),
        }
    }
}
