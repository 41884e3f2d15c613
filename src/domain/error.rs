//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors describe inconsistencies in the flat record set.
/// These are independent of where the records came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("cannot find the root of the hierarchy: no record without a manager")]
    MissingRoot,

    #[error("duplicate identity {identity} at record {position}, keeping the first occurrence")]
    DuplicateIdentity { identity: String, position: usize },

    #[error("cycle detected in hierarchy at: {0}")]
    CyclicReference(String),

    #[error("failed to attach direct reports of {identity}: {reason}")]
    Attachment { identity: String, reason: String },
}
