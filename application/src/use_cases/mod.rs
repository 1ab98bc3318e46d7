//! Application use cases: the conversation loop and the session registry.

pub mod run_conversation;
pub mod session_manager;
