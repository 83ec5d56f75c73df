//! Error types for the editing surface and session.

use outliner_tree::TreeError;
use thiserror::Error;

/// Errors raised while editing or navigating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// An edit needs a cursor but the surface has none.
    #[error("no selection on the editing surface")]
    NoSelection,

    /// Cursor position does not exist in the current value.
    #[error("selection out of range: block {block}, offset {offset}")]
    SelectionOutOfRange { block: usize, offset: usize },

    /// Block index does not exist in the current value.
    #[error("no block at index {0}")]
    NoSuchBlock(usize),

    /// The reducer rejected a transition.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
