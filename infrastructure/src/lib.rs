//! Infrastructure layer: adapters for the application ports.
//!
//! Everything process-external lives here: the in-memory meeting store, the
//! HTTP chat-completion generator, the JSONL transcript logger, and the
//! configuration loader.

pub mod config;
pub mod generator;
pub mod logging;
pub mod storage;

pub use config::{ConfigLoader, FileConfig};
pub use generator::{HttpGeneratorConfig, HttpReplyGenerator};
pub use logging::JsonlConversationLogger;
pub use storage::InMemoryMeetingStore;
