//! The editing surface capability.
//!
//! A surface holds the local batch (the blocks of one node's children) plus a
//! cursor, and applies low-level edits to it. It knows nothing about the tree:
//! the [`SurfaceAdapter`](crate::SurfaceAdapter) normalizes its value after
//! every change and turns navigation gestures into reducer actions.

use outliner_types::Block;

use crate::Result;

/// Caret position: block index in the batch, character offset into the
/// block's plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub block: usize,
    pub offset: usize,
}

impl Cursor {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// An editable view over a local batch.
///
/// Edits that need a cursor fail with
/// [`EditorError::NoSelection`](crate::EditorError::NoSelection) when there is
/// none.
pub trait EditingSurface {
    /// Current batch.
    fn value(&self) -> &[Block];

    /// Mutable access for in-place normalization. The cursor is clamped to the
    /// new value on the next edit.
    fn value_mut(&mut self) -> &mut Vec<Block>;

    /// Replace the batch from outside. Clears the selection, since the old
    /// cursor may point past the end of the new text.
    fn set_value(&mut self, batch: Vec<Block>);

    fn selection(&self) -> Option<Cursor>;

    fn set_selection(&mut self, cursor: Cursor) -> Result<()>;

    fn clear_selection(&mut self);

    /// Insert text at the cursor and advance past it.
    fn insert_text(&mut self, text: &str) -> Result<()>;

    /// Hard break: split the block under the cursor. Both halves keep the
    /// original id until the normalizer disambiguates them.
    fn insert_break(&mut self) -> Result<()>;

    /// Delete one character before the cursor, joining with the previous
    /// block at offset zero.
    fn delete_backward(&mut self) -> Result<()>;

    /// Text between the start of the cursor's line and the cursor.
    fn line_before_cursor(&self) -> Result<String>;

    /// Swap out the block at `index`, keeping the cursor on it at offset zero.
    fn replace_block(&mut self, index: usize, block: Block) -> Result<()>;

    /// Insert a block before `index` (`index == len` appends) and put the
    /// cursor on it at offset zero.
    fn insert_block(&mut self, index: usize, block: Block) -> Result<()>;
}
