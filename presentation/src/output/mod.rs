//! Terminal output rendering.

pub mod console;

pub use console::ConsoleRenderer;
