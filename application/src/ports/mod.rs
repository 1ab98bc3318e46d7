//! Port definitions (interfaces to external collaborators)
//!
//! Ports define how the application layer communicates with the outside
//! world. Implementations (adapters) live in the infrastructure layer.

pub mod conversation_logger;
pub mod generator;
pub mod storage;
