//! Configuration file schema.
//!
//! Mirrors the `roundtable.toml` layout. Every field has a default so an
//! empty (or absent) file yields a working configuration; the generator
//! stays unconfigured until an API key is supplied.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub generator: GeneratorSection,
    pub conversation: ConversationSection,
    pub logging: LoggingSection,
}

/// `[generator]` — the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub base_url: String,
    /// Bearer token; also settable via `ROUNDTABLE_GENERATOR__API_KEY`.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            timeout_secs: 60,
        }
    }
}

impl GeneratorSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[conversation]` — defaults applied to meetings the CLI creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSection {
    /// Exchanges to run; `None` uses the built-in default.
    pub discussion_rounds: Option<u32>,
    /// Per-turn speaking budget in seconds; drives the pacing sleep.
    pub speaking_time_limit: Option<u64>,
    pub max_messages: u32,
    pub auto_summarize: bool,
}

impl Default for ConversationSection {
    fn default() -> Self {
        Self {
            discussion_rounds: None,
            speaking_time_limit: None,
            max_messages: 1000,
            auto_summarize: true,
        }
    }
}

/// `[logging]` — transcript output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// JSONL transcript path; `None` disables the transcript log.
    pub conversation_log: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_the_generator_unconfigured() {
        let config = FileConfig::default();
        assert!(config.generator.api_key.is_none());
        assert_eq!(config.generator.model, "deepseek-chat");
        assert_eq!(config.generator.timeout(), Duration::from_secs(60));
        assert!(config.conversation.auto_summarize);
        assert!(config.logging.conversation_log.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [generator]
            model = "gpt-4o-mini"

            [conversation]
            discussion_rounds = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert_eq!(config.generator.base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.conversation.discussion_rounds, Some(6));
        assert_eq!(config.conversation.max_messages, 1000);
    }
}
