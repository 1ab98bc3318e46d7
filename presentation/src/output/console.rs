//! Console renderer for the event stream.
//!
//! Turns conversation events into colored terminal lines. Typing chunks are
//! skipped; the console shows each turn once, when it completes.

use colored::Colorize;
use roundtable_domain::{ConversationEvent, EventKind, Message};

/// Renders stream events for a terminal transcript.
pub struct ConsoleRenderer {
    quiet: bool,
}

impl ConsoleRenderer {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Render one event; `None` means nothing to print.
    pub fn render(&self, event: &ConversationEvent) -> Option<String> {
        match &event.kind {
            EventKind::Connected { meeting_id } => Some(
                format!("Connected to meeting {meeting_id}")
                    .dimmed()
                    .to_string(),
            ),
            EventKind::ExistingMessage { message, .. } => {
                Some(Self::message_block(message, true))
            }
            EventKind::NewMessage { message, .. } => Some(Self::message_block(message, false)),
            EventKind::MessageStart { persona_name, .. } => {
                if self.quiet {
                    None
                } else {
                    Some(format!("{persona_name} is typing...").dimmed().to_string())
                }
            }
            EventKind::MessageTyping { .. } => None,
            EventKind::MessageComplete {
                persona_name,
                final_content,
                message_kind,
                ..
            } => Some(format!(
                "{}\n{final_content}\n",
                format!("── {persona_name} ({}) ──", message_kind.as_str())
                    .yellow()
                    .bold()
            )),
            EventKind::RoundStarted {
                round_number,
                total_rounds,
                ..
            } => Some(
                format!("=== Round {round_number}/{total_rounds} ===")
                    .cyan()
                    .bold()
                    .to_string(),
            ),
            EventKind::ConversationReset { .. } => {
                Some("Conversation restarted".yellow().to_string())
            }
            EventKind::ConversationPaused { .. } => {
                Some("Conversation paused".yellow().to_string())
            }
            EventKind::ConversationEnded { .. } => {
                Some("Conversation ended".green().bold().to_string())
            }
            EventKind::MeetingError { detail, .. } => {
                Some(format!("Error: {detail}").red().bold().to_string())
            }
            EventKind::Heartbeat => None,
        }
    }

    fn message_block(message: &Message, replayed: bool) -> String {
        let speaker = message
            .metadata
            .persona_name
            .as_deref()
            .unwrap_or("System");
        let marker = if replayed { " (earlier)" } else { "" };
        format!(
            "{}\n{}\n",
            format!("── {speaker} ({}){marker} ──", message.kind.as_str())
                .yellow()
                .bold(),
            message.content
        )
    }
}
