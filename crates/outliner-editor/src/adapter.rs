//! Surface adapter: keystrokes in, normalized batch and navigation out.
//!
//! | Gesture       | Effect                                                   |
//! |---------------|----------------------------------------------------------|
//! | `Enter`       | fence marker on the line → code block, else soft `"\n"`  |
//! | `ShiftEnter`  | hard break (split the block)                             |
//! | `Backspace`   | delete backward                                          |
//! | `Text(s)`     | insert `s` at the cursor                                 |
//! | `Push`        | request navigation into the block under the cursor       |
//! | `Pop`         | request navigation to the parent (ignored at the root)   |
//!
//! Every edit is followed by [`SurfaceAdapter::after_change`], so the surface
//! never holds an unnormalized batch between gestures.

use std::collections::HashSet;

use outliner_tree::{Fence, Normalizer, apply_fence, check_block, detect_fence};
use outliner_types::{Block, IdGenerator, NodeId};

use crate::Result;
use crate::surface::{Cursor, EditingSurface};

/// A key gesture delivered by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyGesture {
    Enter,
    ShiftEnter,
    Backspace,
    Text(String),
    Push,
    Pop,
}

/// Navigation the adapter asks the session to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    /// Commit the batch and focus this block.
    Push(NodeId),
    /// Commit the batch and focus the parent.
    Pop,
}

pub struct SurfaceAdapter<S> {
    surface: S,
    normalizer: Normalizer,
}

impl<S: EditingSurface> SurfaceAdapter<S> {
    pub fn new(surface: S, ids: impl IdGenerator + 'static) -> Self {
        Self {
            surface,
            normalizer: Normalizer::new(ids),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The local batch, as it would be handed to a merge.
    pub fn batch(&self) -> Vec<Block> {
        self.surface.value().to_vec()
    }

    /// Show a new batch. The selection is reset.
    pub fn load(&mut self, batch: Vec<Block>, taken: &dyn Fn(&NodeId) -> bool) {
        self.surface.set_value(batch);
        self.after_change(taken);
    }

    /// Normalize the surface value in place.
    pub fn after_change(&mut self, taken: &dyn Fn(&NodeId) -> bool) {
        let value = self.surface.value_mut();
        for (i, block) in value.iter().enumerate() {
            if let Err(e) = check_block(block) {
                tracing::warn!(index = i, "non-flat block on surface: {e}");
            }
        }
        let report = self.normalizer.normalize(value, taken);
        if !report.reassigned.is_empty() {
            tracing::debug!(count = report.reassigned.len(), "split blocks reassigned");
        }
    }

    /// Apply one gesture. Returns a navigation request for `Push`/`Pop`.
    ///
    /// `has_parent` is false at the root, where `Pop` does nothing. `taken`
    /// reports ids already used by the tree.
    pub fn handle_key(
        &mut self,
        gesture: KeyGesture,
        has_parent: bool,
        taken: &dyn Fn(&NodeId) -> bool,
    ) -> Result<Option<NavigationRequest>> {
        match gesture {
            KeyGesture::Push => {
                let cursor = self
                    .surface
                    .selection()
                    .ok_or(crate::EditorError::NoSelection)?;
                let id = self.surface.value()[cursor.block].id.clone();
                return Ok(Some(NavigationRequest::Push(id)));
            }
            KeyGesture::Pop => {
                if !has_parent {
                    tracing::debug!("pop ignored at the root");
                    return Ok(None);
                }
                return Ok(Some(NavigationRequest::Pop));
            }
            KeyGesture::Enter => self.enter(taken)?,
            KeyGesture::ShiftEnter => self.surface.insert_break()?,
            KeyGesture::Backspace => self.surface.delete_backward()?,
            KeyGesture::Text(text) => self.surface.insert_text(&text)?,
        }
        self.after_change(taken);
        Ok(None)
    }

    fn enter(&mut self, taken: &dyn Fn(&NodeId) -> bool) -> Result<()> {
        let line = self.surface.line_before_cursor()?;
        match detect_fence(&line) {
            Some(fence) => self.open_code_block(fence, line.chars().count(), taken),
            None => self.surface.insert_text("\n"),
        }
    }

    /// Delete the marker and open an empty code block at the cursor.
    ///
    /// A block left empty is converted in place and keeps its id. Otherwise
    /// the code block gets a fresh id and goes between the text before and
    /// after the cursor, splitting the block when there is text on both sides.
    fn open_code_block(
        &mut self,
        fence: Fence,
        marker_len: usize,
        taken: &dyn Fn(&NodeId) -> bool,
    ) -> Result<()> {
        for _ in 0..marker_len {
            self.surface.delete_backward()?;
        }

        let cursor = self
            .surface
            .selection()
            .ok_or(crate::EditorError::NoSelection)?;
        let len = self.surface.value()[cursor.block].plain_text().chars().count();
        if len == 0 {
            let mut block = self.surface.value()[cursor.block].clone();
            apply_fence(&mut block, fence);
            self.surface.replace_block(cursor.block, block)?;
            return self.surface.set_selection(Cursor::new(cursor.block, 0));
        }

        let index = if cursor.offset == 0 {
            cursor.block
        } else {
            if cursor.offset < len {
                self.surface.insert_break()?;
                // the tail needs its own id before anything lands between the halves
                self.after_change(taken);
            }
            cursor.block + 1
        };

        let in_batch: HashSet<NodeId> = self.surface.value().iter().map(|b| b.id.clone()).collect();
        let id = self
            .normalizer
            .fresh_id(|id| in_batch.contains(id) || taken(id));
        let mut code = Block::empty_paragraph(id);
        apply_fence(&mut code, fence);
        self.surface.insert_block(index, code)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for SurfaceAdapter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceAdapter")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}
