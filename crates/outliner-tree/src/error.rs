//! Error types for tree and reducer operations.

use outliner_types::NodeId;
use thiserror::Error;

/// Errors that can occur while mutating or loading the tree.
///
/// `NotFound` and `InvalidTarget` abort the attempted transition and leave the
/// state unchanged. `MalformedBatch` is reported by the normalizer's checks;
/// the reducer repairs such batches instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node id does not resolve in the tree.
    #[error("node not found: {0:?}")]
    NotFound(NodeId),

    /// Merge target is neither in the batch nor already in the tree.
    #[error("invalid merge target: {0:?}")]
    InvalidTarget(NodeId),

    /// A block violates the leaf/element homogeneity invariant.
    #[error("malformed block {id:?}: {reason}")]
    MalformedBatch { id: NodeId, reason: String },

    /// Loaded text is not a valid state dump.
    #[error("cannot load state: {0}")]
    Deserialization(String),

    /// State could not be written out as a dump.
    #[error("cannot dump state: {0}")]
    Serialization(String),

    /// Structural invariant of the tree is violated.
    #[error("inconsistent tree: {0}")]
    Inconsistent(String),
}

/// Parse failures only; `State::to_json` maps its own errors to `Serialization`.
impl From<serde_json::Error> for TreeError {
    fn from(e: serde_json::Error) -> Self {
        TreeError::Deserialization(e.to_string())
    }
}
