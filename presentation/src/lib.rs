//! Presentation layer: CLI arguments, terminal rendering, and stream framing.

pub mod cli;
pub mod output;
pub mod stream;

pub use cli::{Cli, OutputFormat};
pub use output::ConsoleRenderer;
