//! The conversation loop.
//!
//! One [`ConversationLoop`] owns a meeting's session: it repeatedly picks a
//! speaker, asks the external generator for a turn, persists and broadcasts
//! the result, and enforces the termination rules. Control (pause, resume,
//! stop, force-speak) is cooperative — flags and commands are honored at the
//! checkpoints between turns, never mid-generation.

use crate::broadcaster::EventBroadcaster;
use crate::fallback;
use crate::ports::conversation_logger::{ConversationLogger, LogEvent};
use crate::ports::generator::{ReplyGenerator, ReplyRequest, RoleType};
use crate::ports::storage::{MeetingStore, NewMessage, StorageError};
use chrono::Utc;
use roundtable_domain::{
    ConversationEvent, ConversationMode, EventKind, InterviewCast, Meeting,
    MeetingId, MeetingRules, MeetingStatus, MessageKind, Persona, PersonaId,
    SessionState, SessionStatus, SpeakerScheduler, TypewriterPacing, is_interviewer,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Exchanges to run when the meeting rules don't configure a round count.
const DEFAULT_DISCUSSION_ROUNDS: u32 = 4;

/// A best score below this means nobody has anything to say; end the
/// conversation rather than force a turn.
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.1;

/// Sequential turns per round in discussion mode.
const TURNS_PER_DISCUSSION_ROUND: u32 = 2;

/// Messages fetched for generator history and the dedupe seed.
const HISTORY_LIMIT: usize = 50;

/// Fixed delay between rounds.
const ROUND_DELAY: Duration = Duration::from_secs(2);

/// Poll interval while paused, between control checks.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Errors surfaced to the caller of `start_conversation`.
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Meeting must be active to start a conversation (status: {0:?})")]
    MeetingNotActive(MeetingStatus),

    #[error("No participants found for meeting {0}")]
    NoParticipants(MeetingId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Cooperative control flags shared between the registry and the loop.
///
/// Stop is a [`CancellationToken`] and is final; pause is a flag the loop
/// polls between turns.
#[derive(Default)]
pub struct SessionControl {
    pause: AtomicBool,
    stop: CancellationToken,
}

impl SessionControl {
    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Commands delivered to the loop between turns.
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    /// Run one turn for the named persona regardless of its score.
    ForceSpeak(PersonaId),
}

/// Pacing knobs for the loop and the typewriter.
///
/// The per-turn interval defaults to `speaking_time_limit / 30`, clamped to
/// 3–8 seconds (4 s when the rule is absent); tests override everything to
/// zero.
#[derive(Debug, Clone, Copy)]
pub struct PacingConfig {
    /// Override for the per-turn pacing sleep; `None` derives it from the
    /// meeting rules.
    pub speaking_interval: Option<Duration>,
    pub round_delay: Duration,
    pub typewriter: TypewriterPacing,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            speaking_interval: None,
            round_delay: ROUND_DELAY,
            typewriter: TypewriterPacing::default(),
        }
    }
}

impl PacingConfig {
    /// No delays anywhere; for tests and batch runs.
    pub fn instant() -> Self {
        Self {
            speaking_interval: Some(Duration::ZERO),
            round_delay: Duration::ZERO,
            typewriter: TypewriterPacing::immediate(),
        }
    }

    /// Effective per-turn pacing sleep for the given rules.
    pub fn effective_speaking_interval(&self, rules: &MeetingRules) -> Duration {
        if let Some(interval) = self.speaking_interval {
            return interval;
        }
        let secs = rules
            .speaking_time_limit
            .map(|limit| (limit / 30).clamp(3, 8))
            .unwrap_or(4);
        Duration::from_secs(secs)
    }
}

/// The state machine driving one meeting's conversation.
pub struct ConversationLoop<S, G> {
    store: Arc<S>,
    generator: Arc<G>,
    broadcaster: Arc<EventBroadcaster>,
    logger: Arc<dyn ConversationLogger>,
    meeting: Meeting,
    mode: ConversationMode,
    scheduler: SpeakerScheduler,
    cast: Option<InterviewCast>,
    state: Arc<Mutex<SessionState>>,
    control: Arc<SessionControl>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    pacing: PacingConfig,
    seen_content: HashSet<String>,
}

impl<S, G> ConversationLoop<S, G>
where
    S: MeetingStore + 'static,
    G: ReplyGenerator + 'static,
{
    /// Load the roster and rules and prepare a runnable loop.
    ///
    /// Fails if the meeting is missing, not active, or has no participants.
    #[allow(clippy::too_many_arguments)]
    pub async fn initialize(
        store: Arc<S>,
        generator: Arc<G>,
        broadcaster: Arc<EventBroadcaster>,
        logger: Arc<dyn ConversationLogger>,
        meeting_id: MeetingId,
        control: Arc<SessionControl>,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        pacing: PacingConfig,
    ) -> Result<Self, ConversationError> {
        let meeting = store.get_meeting(meeting_id).await?;
        if meeting.status != MeetingStatus::Active {
            return Err(ConversationError::MeetingNotActive(meeting.status));
        }

        let participants = store.get_participants(meeting_id).await?;
        if participants.is_empty() {
            return Err(ConversationError::NoParticipants(meeting_id));
        }

        let mut scheduler = SpeakerScheduler::new();
        for participant in participants {
            let persona = store.get_persona(participant.persona_id).await?;
            scheduler.add(persona, participant);
        }

        let mode = ConversationMode::detect(&meeting.topic);
        let cast = match mode {
            ConversationMode::Interview => {
                Some(InterviewCast::partition(&scheduler.personas()))
            }
            ConversationMode::Discussion => None,
        };

        // Seed the dedupe set so a restarted conversation doesn't repeat
        // content already persisted for this meeting.
        let seen_content: HashSet<String> = store
            .recent_messages(meeting_id, HISTORY_LIMIT)
            .await?
            .into_iter()
            .map(|m| m.content)
            .collect();

        let mut state = SessionState::new(meeting_id);
        state.transition(SessionStatus::Initializing);

        info!(
            meeting_id = meeting_id.0,
            mode = %mode,
            roster = scheduler.len(),
            "conversation initialized"
        );

        Ok(Self {
            store,
            generator,
            broadcaster,
            logger,
            meeting,
            mode,
            scheduler,
            cast,
            state: Arc::new(Mutex::new(state)),
            control,
            commands,
            pacing,
            seen_content,
        })
    }

    /// Shared view of the session state, for the registry.
    pub fn state_handle(&self) -> Arc<Mutex<SessionState>> {
        Arc::clone(&self.state)
    }

    /// Drive the conversation to completion.
    pub async fn run(mut self) {
        self.set_status(SessionStatus::Running);

        let total_rounds = self
            .meeting
            .rules
            .discussion_rounds
            .unwrap_or(DEFAULT_DISCUSSION_ROUNDS);
        let speaking_interval = self
            .pacing
            .effective_speaking_interval(&self.meeting.rules);
        let cast = self.cast.clone();

        info!(
            meeting_id = self.meeting.id.0,
            mode = %self.mode,
            total_rounds,
            "starting conversation loop"
        );

        'rounds: for _ in 0..total_rounds {
            if self.handle_control().await {
                break 'rounds;
            }
            if !self.should_continue() {
                info!(meeting_id = self.meeting.id.0, "termination rule reached");
                break 'rounds;
            }

            let round_number = {
                let mut state = self.state.lock().expect("session state poisoned");
                state.begin_round()
            };
            self.publish(EventKind::RoundStarted {
                meeting_id: self.meeting.id,
                round_number,
                total_rounds,
            });
            self.logger.log(LogEvent::new(
                "round_started",
                json!({
                    "meeting_id": self.meeting.id.0,
                    "round_number": round_number,
                    "total_rounds": total_rounds,
                }),
            ));

            match self.mode {
                ConversationMode::Interview => {
                    let Some(cast) = cast.as_ref().filter(|c| c.is_complete()) else {
                        warn!(
                            meeting_id = self.meeting.id.0,
                            "interview roster incomplete, ending conversation"
                        );
                        break 'rounds;
                    };
                    let idx = (round_number - 1) as usize;
                    let interviewer = cast.interviewers[idx % cast.interviewers.len()].clone();
                    let interviewee = cast.interviewees[idx % cast.interviewees.len()].clone();

                    if self
                        .take_turn(&interviewer, RoleType::Interviewer, Some(&interviewee))
                        .await
                    {
                        sleep(speaking_interval).await;
                    }
                    if self.handle_control().await {
                        break 'rounds;
                    }
                    if self
                        .take_turn(&interviewee, RoleType::Interviewee, Some(&interviewer))
                        .await
                    {
                        sleep(speaking_interval).await;
                    }
                }
                ConversationMode::Discussion => {
                    for _ in 0..TURNS_PER_DISCUSSION_ROUND {
                        if self.handle_control().await {
                            break 'rounds;
                        }
                        if !self.should_continue() {
                            break 'rounds;
                        }

                        let context = self.build_context().await;
                        let recent = {
                            let state =
                                self.state.lock().expect("session state poisoned");
                            state.recent_speakers()
                        };
                        let Some(choice) = self.scheduler.select_next(
                            &context,
                            &recent,
                            &self.meeting.rules,
                        ) else {
                            info!(
                                meeting_id = self.meeting.id.0,
                                "no eligible speaker, ending conversation"
                            );
                            break 'rounds;
                        };
                        if choice.score < LOW_CONFIDENCE_THRESHOLD {
                            info!(
                                meeting_id = self.meeting.id.0,
                                score = choice.score,
                                "best speaker score below threshold, ending conversation"
                            );
                            break 'rounds;
                        }

                        let Some(persona) = self.scheduler.get(choice.persona_id).cloned()
                        else {
                            break 'rounds;
                        };
                        debug!(
                            meeting_id = self.meeting.id.0,
                            persona = %persona.name,
                            score = choice.score,
                            "next speaker selected"
                        );
                        if self.take_turn(&persona, RoleType::Participant, None).await {
                            sleep(speaking_interval).await;
                        }
                    }
                }
            }

            sleep(self.pacing.round_delay).await;
        }

        let stopped = self.control.is_stopped();
        let message_count = {
            let state = self.state.lock().expect("session state poisoned");
            state.message_count
        };
        if !stopped && self.meeting.rules.auto_summarize && message_count > 0 {
            self.summarize(message_count).await;
        }

        self.publish(EventKind::ConversationEnded {
            meeting_id: self.meeting.id,
        });
        self.logger.log(LogEvent::new(
            "conversation_ended",
            json!({
                "meeting_id": self.meeting.id.0,
                "message_count": message_count,
            }),
        ));
        self.set_status(if stopped {
            SessionStatus::Stopped
        } else {
            SessionStatus::Completed
        });

        info!(
            meeting_id = self.meeting.id.0,
            message_count, stopped, "conversation loop finished"
        );
    }

    /// Honor pending control state.
    ///
    /// Drains force-speak commands, waits out a pause, and returns `true`
    /// when a stop was requested.
    async fn handle_control(&mut self) -> bool {
        let mut announced_pause = false;
        loop {
            while let Ok(command) = self.commands.try_recv() {
                match command {
                    SessionCommand::ForceSpeak(persona_id) => {
                        self.force_turn(persona_id).await;
                    }
                }
            }

            if self.control.is_stopped() {
                return true;
            }
            if !self.control.is_paused() {
                if announced_pause {
                    info!(meeting_id = self.meeting.id.0, "conversation resumed");
                    self.set_status(SessionStatus::Running);
                }
                return false;
            }

            if !announced_pause {
                announced_pause = true;
                self.set_status(SessionStatus::Paused);
                self.publish(EventKind::ConversationPaused {
                    meeting_id: self.meeting.id,
                });
                info!(meeting_id = self.meeting.id.0, "conversation paused");
            }
            sleep(PAUSE_POLL_INTERVAL).await;
        }
    }

    /// Termination rules checked between turns: wall-clock limit and the
    /// message cap. The round cap is the loop bound itself.
    fn should_continue(&self) -> bool {
        let state = self.state.lock().expect("session state poisoned");

        if let Some(limit_minutes) = self.meeting.duration_limit {
            let elapsed = state.elapsed(Utc::now());
            if elapsed >= chrono::Duration::minutes(limit_minutes as i64) {
                return false;
            }
        }

        state.message_count < self.meeting.rules.max_messages
    }

    /// Run one scheduled turn. Returns `true` if a message was produced.
    ///
    /// Generation failure falls back to templated content; persistence
    /// failure aborts the turn (logged, loop continues); duplicate content
    /// is skipped entirely.
    async fn take_turn(
        &mut self,
        persona: &Persona,
        role_type: RoleType,
        target: Option<&Persona>,
    ) -> bool {
        let context = self.build_context().await;
        let history = self
            .store
            .recent_messages(self.meeting.id, HISTORY_LIMIT)
            .await
            .unwrap_or_default();
        let exchange_index = {
            let state = self.state.lock().expect("session state poisoned");
            state.message_count
        };

        let request = ReplyRequest {
            persona: persona.clone(),
            mode: self.mode,
            role_type,
            target: target.cloned(),
            meeting_title: self.meeting.title.clone(),
            topic: self.meeting.topic.clone(),
            context,
            history,
            exchange_index,
        };

        let reply = match self.generator.generate(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    meeting_id = self.meeting.id.0,
                    persona = %persona.name,
                    error = %e,
                    "generation failed, using templated fallback"
                );
                fallback::templated_reply(&request)
            }
        };

        if self.seen_content.contains(&reply.content) {
            debug!(
                meeting_id = self.meeting.id.0,
                persona = %persona.name,
                "duplicate content, skipping turn"
            );
            return false;
        }

        let mut metadata = reply.metadata;
        metadata.persona_name.get_or_insert_with(|| persona.name.clone());
        metadata.persona_role.get_or_insert_with(|| persona.role.clone());
        metadata.exchange_index.get_or_insert(exchange_index);

        let message = match self
            .store
            .append_message(NewMessage {
                meeting_id: self.meeting.id,
                persona_id: Some(persona.id),
                content: reply.content,
                kind: reply.kind,
                metadata,
            })
            .await
        {
            Ok(message) => message,
            Err(e) => {
                error!(
                    meeting_id = self.meeting.id.0,
                    persona = %persona.name,
                    error = %e,
                    "failed to persist turn"
                );
                self.publish(EventKind::MeetingError {
                    meeting_id: self.meeting.id,
                    detail: format!("failed to persist turn for {}", persona.name),
                });
                return false;
            }
        };

        self.seen_content.insert(message.content.clone());

        let now = Utc::now();
        {
            let mut state = self.state.lock().expect("session state poisoned");
            state.record_speaker(persona.id);
        }
        self.scheduler.record_response(persona.id, now);
        let response_count = self
            .scheduler
            .get(persona.id)
            .map(|p| p.response_count)
            .unwrap_or(0);
        if let Err(e) = self
            .store
            .update_participant_stats(self.meeting.id, persona.id, response_count, now)
            .await
        {
            warn!(
                meeting_id = self.meeting.id.0,
                persona = %persona.name,
                error = %e,
                "failed to update participant stats"
            );
        }

        self.logger.log(LogEvent::new(
            "message_persisted",
            json!({
                "meeting_id": self.meeting.id.0,
                "message_id": message.id.0,
                "persona_id": persona.id.0,
                "persona_name": persona.name,
                "kind": message.kind.as_str(),
                "role_type": role_type.as_str(),
            }),
        ));
        info!(
            meeting_id = self.meeting.id.0,
            persona = %persona.name,
            kind = message.kind.as_str(),
            "turn persisted"
        );

        // Persisted first; the reveal is presentation only.
        self.broadcaster
            .deliver_typewriter(&message, self.pacing.typewriter)
            .await;

        true
    }

    /// Run one turn for a named persona, bypassing scheduling.
    async fn force_turn(&mut self, persona_id: PersonaId) {
        let Some(persona) = self.scheduler.get(persona_id).cloned() else {
            warn!(
                meeting_id = self.meeting.id.0,
                persona_id = persona_id.0,
                "force-speak target is not on the roster"
            );
            self.publish(EventKind::MeetingError {
                meeting_id: self.meeting.id,
                detail: format!("persona {persona_id} is not part of this meeting"),
            });
            return;
        };

        let role_type = match self.mode {
            ConversationMode::Interview if is_interviewer(&persona) => RoleType::Interviewer,
            ConversationMode::Interview => RoleType::Interviewee,
            ConversationMode::Discussion => RoleType::Participant,
        };

        info!(
            meeting_id = self.meeting.id.0,
            persona = %persona.name,
            "force-speak turn"
        );
        self.take_turn(&persona, role_type, None).await;
    }

    /// Closing summary, persisted without a persona and broadcast as a
    /// plain `new_message` (no typewriter).
    async fn summarize(&mut self, message_count: u32) {
        let content = fallback::meeting_summary(
            &self.meeting.topic,
            message_count,
            self.scheduler.len(),
        );
        let metadata = roundtable_domain::MessageMetadata {
            generated_by: Some("template".to_string()),
            ..Default::default()
        };

        match self
            .store
            .append_message(NewMessage {
                meeting_id: self.meeting.id,
                persona_id: None,
                content,
                kind: MessageKind::MeetingSummary,
                metadata,
            })
            .await
        {
            Ok(message) => {
                self.logger.log(LogEvent::new(
                    "meeting_summary",
                    json!({
                        "meeting_id": self.meeting.id.0,
                        "message_id": message.id.0,
                    }),
                ));
                self.publish(EventKind::NewMessage {
                    meeting_id: self.meeting.id,
                    message,
                });
            }
            Err(e) => {
                warn!(
                    meeting_id = self.meeting.id.0,
                    error = %e,
                    "failed to persist meeting summary"
                );
            }
        }
    }

    /// Assemble the discussion context handed to scoring and generation:
    /// topic, framing, and excerpts of the most recent turns.
    async fn build_context(&self) -> String {
        let mut parts = vec![format!("Meeting topic: {}", self.meeting.topic)];

        let discussion = &self.meeting.discussion;
        if !discussion.discussion_topic.is_empty() {
            parts.push(format!("Discussion topic: {}", discussion.discussion_topic));
        }
        if let Some(description) = &discussion.context_description {
            parts.push(format!("Background: {description}"));
        }
        if !discussion.expected_outcomes.is_empty() {
            parts.push(format!(
                "Expected outcomes: {}",
                discussion.expected_outcomes.join(", ")
            ));
        }

        let recent = self
            .store
            .recent_messages(self.meeting.id, 5)
            .await
            .unwrap_or_default();
        if !recent.is_empty() {
            parts.push("Recent discussion:".to_string());
            for message in recent.iter().rev().take(3).rev() {
                let speaker = message
                    .metadata
                    .persona_name
                    .clone()
                    .unwrap_or_else(|| "System".to_string());
                let excerpt: String = message.content.chars().take(100).collect();
                parts.push(format!("{speaker}: {excerpt}"));
            }
        }

        parts.join("\n")
    }

    fn set_status(&self, status: SessionStatus) {
        let mut state = self.state.lock().expect("session state poisoned");
        state.transition(status);
    }

    fn publish(&self, kind: EventKind) {
        self.broadcaster
            .publish(self.meeting.id, ConversationEvent::now(kind));
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaking_interval_derived_from_rules() {
        let pacing = PacingConfig::default();

        let mut rules = MeetingRules::default();
        assert_eq!(
            pacing.effective_speaking_interval(&rules),
            Duration::from_secs(4)
        );

        rules.speaking_time_limit = Some(300);
        assert_eq!(
            pacing.effective_speaking_interval(&rules),
            Duration::from_secs(8)
        );

        rules.speaking_time_limit = Some(30);
        assert_eq!(
            pacing.effective_speaking_interval(&rules),
            Duration::from_secs(3)
        );

        rules.speaking_time_limit = Some(150);
        assert_eq!(
            pacing.effective_speaking_interval(&rules),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn instant_pacing_has_no_delays() {
        let pacing = PacingConfig::instant();
        assert_eq!(
            pacing.effective_speaking_interval(&MeetingRules::default()),
            Duration::ZERO
        );
        assert_eq!(pacing.round_delay, Duration::ZERO);
        assert!(pacing.typewriter.char_delay.is_zero());
    }
}
