//! Reply generator adapters and prompt assembly.

pub mod http;
pub mod prompt;

pub use http::{HttpGeneratorConfig, HttpReplyGenerator};
