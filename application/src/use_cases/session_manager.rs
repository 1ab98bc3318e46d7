//! Session registry.
//!
//! [`SessionManager`] owns at most one conversation loop per meeting. It
//! starts loops, routes control requests (pause/resume/stop/force-speak) to
//! the loop that owns the meeting, and hands out event-stream subscriptions
//! seeded with the connected acknowledgment and a replay of persisted
//! messages. Entries for finished loops are reclaimed automatically.

use crate::broadcaster::{EventBroadcaster, Subscription};
use crate::ports::conversation_logger::{ConversationLogger, LogEvent};
use crate::ports::generator::ReplyGenerator;
use crate::ports::storage::MeetingStore;
use crate::use_cases::run_conversation::{
    ConversationError, ConversationLoop, PacingConfig, SessionCommand, SessionControl,
};
use roundtable_domain::{ConversationEvent, EventKind, MeetingId, PersonaId, SessionState, SessionStatus};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Persisted messages replayed to a fresh subscriber.
const REPLAY_LIMIT: usize = 100;

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh loop was spawned.
    Started,
    /// A loop was already running and `force_restart` was not set; the
    /// request is an acknowledged no-op.
    AlreadyInProgress,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No active session for meeting {0}")]
    SessionNotFound(MeetingId),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
    control: Arc<SessionControl>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: JoinHandle<()>,
}

/// At most one conversation loop per meeting, keyed by meeting id.
pub struct SessionManager<S, G> {
    store: Arc<S>,
    generator: Arc<G>,
    broadcaster: Arc<EventBroadcaster>,
    logger: Arc<dyn ConversationLogger>,
    pacing: PacingConfig,
    sessions: Mutex<HashMap<MeetingId, SessionHandle>>,
}

impl<S, G> SessionManager<S, G>
where
    S: MeetingStore + 'static,
    G: ReplyGenerator + 'static,
{
    pub fn new(
        store: Arc<S>,
        generator: Arc<G>,
        broadcaster: Arc<EventBroadcaster>,
        logger: Arc<dyn ConversationLogger>,
    ) -> Self {
        Self {
            store,
            generator,
            broadcaster,
            logger,
            pacing: PacingConfig::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Start a conversation loop for the meeting.
    ///
    /// If a loop is already in progress the call is a no-op unless
    /// `force_restart` is set, in which case the old loop is discarded, a
    /// `conversation_reset` event is broadcast, and a fresh loop begins.
    pub async fn start_conversation(
        self: &Arc<Self>,
        meeting_id: MeetingId,
        force_restart: bool,
    ) -> Result<StartOutcome, SessionError> {
        // Fast path: an in-progress loop short-circuits before any storage
        // reads.
        if !force_restart && self.session_in_progress(meeting_id) {
            return Ok(StartOutcome::AlreadyInProgress);
        }

        let control = Arc::new(SessionControl::default());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let conversation = ConversationLoop::initialize(
            Arc::clone(&self.store),
            Arc::clone(&self.generator),
            Arc::clone(&self.broadcaster),
            Arc::clone(&self.logger),
            meeting_id,
            Arc::clone(&control),
            command_rx,
            self.pacing,
        )
        .await?;
        let state = conversation.state_handle();

        // Re-check under the lock: initialization awaited, so another start
        // may have slipped in.
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        if let Some(existing) = sessions.get(&meeting_id) {
            let status = existing
                .state
                .lock()
                .expect("session state poisoned")
                .status;
            if !status.is_terminal() && !force_restart {
                return Ok(StartOutcome::AlreadyInProgress);
            }
            if let Some(existing) = sessions.remove(&meeting_id) {
                existing.control.request_stop();
                existing.task.abort();
                if !status.is_terminal() {
                    self.broadcaster.publish(
                        meeting_id,
                        ConversationEvent::now(EventKind::ConversationReset { meeting_id }),
                    );
                    self.logger.log(LogEvent::new(
                        "conversation_reset",
                        json!({ "meeting_id": meeting_id.0 }),
                    ));
                    info!(meeting_id = meeting_id.0, "force-restarting conversation");
                }
            }
        }

        let manager = Arc::clone(self);
        let cleanup_control = Arc::clone(&control);
        let task = tokio::spawn(async move {
            conversation.run().await;
            manager.reclaim(meeting_id, &cleanup_control);
        });

        sessions.insert(
            meeting_id,
            SessionHandle {
                state,
                control,
                commands,
                task,
            },
        );
        info!(meeting_id = meeting_id.0, "conversation session started");
        Ok(StartOutcome::Started)
    }

    /// Ask the loop to pause at its next checkpoint. In-flight turns
    /// complete first.
    pub fn pause_conversation(&self, meeting_id: MeetingId) -> Result<(), SessionError> {
        self.with_live_session(meeting_id, |handle| handle.control.request_pause())
    }

    /// Clear a pause request; the loop resumes at its next poll.
    pub fn resume_conversation(&self, meeting_id: MeetingId) -> Result<(), SessionError> {
        self.with_live_session(meeting_id, |handle| handle.control.resume())
    }

    /// Ask the loop to stop at its next checkpoint. Stop also takes effect
    /// while paused.
    pub fn stop_conversation(&self, meeting_id: MeetingId) -> Result<(), SessionError> {
        self.with_live_session(meeting_id, |handle| handle.control.request_stop())
    }

    /// Queue one out-of-band turn for the named persona, bypassing
    /// scheduling. The turn runs at the loop's next checkpoint, including
    /// while paused.
    pub fn force_speak(
        &self,
        meeting_id: MeetingId,
        persona_id: PersonaId,
    ) -> Result<(), SessionError> {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        let handle = sessions
            .get(&meeting_id)
            .ok_or(SessionError::SessionNotFound(meeting_id))?;
        handle
            .commands
            .send(SessionCommand::ForceSpeak(persona_id))
            .map_err(|_| SessionError::SessionNotFound(meeting_id))
    }

    /// Subscribe to the meeting's event stream.
    ///
    /// The subscription is seeded with a `connected` acknowledgment followed
    /// by a replay of up to [`REPLAY_LIMIT`] persisted messages (oldest
    /// first) before any live event; other subscribers see none of this.
    pub async fn subscribe_stream(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Subscription, SessionError> {
        let meeting = self
            .store
            .get_meeting(meeting_id)
            .await
            .map_err(ConversationError::from)?;
        let existing = self
            .store
            .recent_messages(meeting.id, REPLAY_LIMIT)
            .await
            .map_err(ConversationError::from)?;

        let mut seed = Vec::with_capacity(existing.len() + 1);
        seed.push(ConversationEvent::now(EventKind::Connected { meeting_id }));
        for message in existing {
            seed.push(ConversationEvent::now(EventKind::ExistingMessage {
                meeting_id,
                message,
            }));
        }
        Ok(self.broadcaster.subscribe_seeded(meeting_id, seed))
    }

    /// Runtime status of the meeting's loop, if one is registered.
    pub fn session_status(&self, meeting_id: MeetingId) -> Option<SessionStatus> {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        sessions
            .get(&meeting_id)
            .map(|handle| handle.state.lock().expect("session state poisoned").status)
    }

    fn session_in_progress(&self, meeting_id: MeetingId) -> bool {
        self.session_status(meeting_id)
            .is_some_and(|status| !status.is_terminal())
    }

    fn with_live_session(
        &self,
        meeting_id: MeetingId,
        f: impl FnOnce(&SessionHandle),
    ) -> Result<(), SessionError> {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        let handle = sessions
            .get(&meeting_id)
            .ok_or(SessionError::SessionNotFound(meeting_id))?;
        f(handle);
        Ok(())
    }

    /// Drop the registry entry once its loop has finished, unless a restart
    /// already replaced it.
    fn reclaim(&self, meeting_id: MeetingId, control: &Arc<SessionControl>) {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        if let Some(handle) = sessions.get(&meeting_id) {
            if Arc::ptr_eq(&handle.control, control) {
                sessions.remove(&meeting_id);
            }
        }
    }
}
