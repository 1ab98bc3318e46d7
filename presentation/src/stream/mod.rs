//! Event stream framing for external consumers.

pub mod sse;
