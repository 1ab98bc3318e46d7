//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Persona {0} is not part of this meeting")]
    UnknownPersona(i64),
}
