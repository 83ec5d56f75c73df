//! In-memory editing surface.
//!
//! Offsets are character offsets into a block's plain text; a position at a
//! boundary between two leaves belongs to the earlier leaf. Edits walk the
//! block's document tree to find the leaf that owns the position, so nested
//! elements work the same as flat blocks.

use outliner_types::{Block, DocNode, Element, TextLeaf};

use crate::surface::{Cursor, EditingSurface};
use crate::{EditorError, Result};

/// A surface that keeps its batch and cursor in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    blocks: Vec<Block>,
    cursor: Option<Cursor>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            cursor: None,
        }
    }

    /// Cursor clamped to the current value, or an error if there is none.
    fn caret(&self) -> Result<Cursor> {
        let cursor = self.cursor.ok_or(EditorError::NoSelection)?;
        let last = self
            .blocks
            .len()
            .checked_sub(1)
            .ok_or(EditorError::NoSelection)?;
        let block = cursor.block.min(last);
        let offset = cursor.offset.min(text_len(&self.blocks[block].children));
        Ok(Cursor { block, offset })
    }
}

impl EditingSurface for MemorySurface {
    fn value(&self) -> &[Block] {
        &self.blocks
    }

    fn value_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    fn set_value(&mut self, batch: Vec<Block>) {
        self.blocks = batch;
        self.cursor = None;
    }

    fn selection(&self) -> Option<Cursor> {
        self.caret().ok()
    }

    fn set_selection(&mut self, cursor: Cursor) -> Result<()> {
        let block = self
            .blocks
            .get(cursor.block)
            .ok_or(EditorError::SelectionOutOfRange {
                block: cursor.block,
                offset: cursor.offset,
            })?;
        if cursor.offset > text_len(&block.children) {
            return Err(EditorError::SelectionOutOfRange {
                block: cursor.block,
                offset: cursor.offset,
            });
        }
        self.cursor = Some(cursor);
        Ok(())
    }

    fn clear_selection(&mut self) {
        self.cursor = None;
    }

    fn insert_text(&mut self, text: &str) -> Result<()> {
        let caret = self.caret()?;
        let block = &mut self.blocks[caret.block];
        if !insert_at(&mut block.children, caret.offset, text) {
            block.children.push(DocNode::text(text));
        }
        self.cursor = Some(Cursor::new(caret.block, caret.offset + char_len(text)));
        Ok(())
    }

    fn insert_break(&mut self) -> Result<()> {
        let caret = self.caret()?;
        let left = &mut self.blocks[caret.block];
        let right = Block {
            id: left.id.clone(),
            kind: left.kind,
            language: left.language.clone(),
            children: split_off(&mut left.children, caret.offset),
            depth: left.depth,
        };
        self.blocks.insert(caret.block + 1, right);
        self.cursor = Some(Cursor::new(caret.block + 1, 0));
        Ok(())
    }

    fn delete_backward(&mut self) -> Result<()> {
        let caret = self.caret()?;
        if caret.offset > 0 {
            remove_char(&mut self.blocks[caret.block].children, caret.offset - 1);
            self.cursor = Some(Cursor::new(caret.block, caret.offset - 1));
            return Ok(());
        }
        if caret.block == 0 {
            return Ok(());
        }

        let removed = self.blocks.remove(caret.block);
        let prev = &mut self.blocks[caret.block - 1];
        let joint = text_len(&prev.children);
        prev.children.extend(removed.children);
        self.cursor = Some(Cursor::new(caret.block - 1, joint));
        Ok(())
    }

    fn line_before_cursor(&self) -> Result<String> {
        let caret = self.caret()?;
        let text = self.blocks[caret.block].plain_text();
        let before = &text[..byte_at(&text, caret.offset)];
        Ok(outliner_tree::current_line(before).to_string())
    }

    fn replace_block(&mut self, index: usize, block: Block) -> Result<()> {
        let slot = self
            .blocks
            .get_mut(index)
            .ok_or(EditorError::NoSuchBlock(index))?;
        *slot = block;
        self.cursor = Some(Cursor::new(index, 0));
        Ok(())
    }

    fn insert_block(&mut self, index: usize, block: Block) -> Result<()> {
        if index > self.blocks.len() {
            return Err(EditorError::NoSuchBlock(index));
        }
        self.blocks.insert(index, block);
        self.cursor = Some(Cursor::new(index, 0));
        Ok(())
    }
}

// ── text helpers ─────────────────────────────────────────────────────────

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_at(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

fn node_len(node: &DocNode) -> usize {
    match node {
        DocNode::Text(leaf) => char_len(&leaf.text),
        DocNode::Element(el) => text_len(&el.children),
    }
}

fn text_len(children: &[DocNode]) -> usize {
    children.iter().map(node_len).sum()
}

/// Insert at a character offset. False when the offset is past the end.
fn insert_at(children: &mut Vec<DocNode>, mut offset: usize, text: &str) -> bool {
    if children.is_empty() && offset == 0 {
        children.push(DocNode::text(text));
        return true;
    }
    for node in children.iter_mut() {
        let len = node_len(node);
        if offset <= len {
            return match node {
                DocNode::Text(leaf) => {
                    let at = byte_at(&leaf.text, offset);
                    leaf.text.insert_str(at, text);
                    true
                }
                DocNode::Element(el) => insert_at(&mut el.children, offset, text),
            };
        }
        offset -= len;
    }
    false
}

/// Remove the character at `index`.
fn remove_char(children: &mut [DocNode], mut index: usize) -> bool {
    for node in children.iter_mut() {
        let len = node_len(node);
        if index < len {
            return match node {
                DocNode::Text(leaf) => {
                    let at = byte_at(&leaf.text, index);
                    leaf.text.remove(at);
                    true
                }
                DocNode::Element(el) => remove_char(&mut el.children, index),
            };
        }
        index -= len;
    }
    false
}

/// Split at a character offset, leaving the head in place and returning the
/// tail. Elements cut by the split are duplicated with the same kind.
fn split_off(children: &mut Vec<DocNode>, mut offset: usize) -> Vec<DocNode> {
    for i in 0..children.len() {
        let len = node_len(&children[i]);
        if offset <= len {
            let rest: Vec<DocNode> = children.drain(i + 1..).collect();
            let head = match &mut children[i] {
                DocNode::Text(leaf) => {
                    let at = byte_at(&leaf.text, offset);
                    DocNode::Text(TextLeaf::new(leaf.text.split_off(at)))
                }
                DocNode::Element(el) => DocNode::Element(Element {
                    kind: el.kind,
                    children: split_off(&mut el.children, offset),
                    depth: el.depth,
                }),
            };
            let mut tail = vec![head];
            tail.extend(rest);
            return tail;
        }
        offset -= len;
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use outliner_types::NodeId;

    fn surface(texts: &[&str]) -> MemorySurface {
        MemorySurface::with_value(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Block::paragraph(NodeId::from_string(format!("b{i}")), *t))
                .collect(),
        )
    }

    fn texts(s: &MemorySurface) -> Vec<String> {
        s.value().iter().map(Block::plain_text).collect()
    }

    #[test]
    fn test_edits_need_selection() {
        let mut s = surface(&["hello"]);
        assert_eq!(s.insert_text("x"), Err(EditorError::NoSelection));
        assert_eq!(s.selection(), None);
    }

    #[test]
    fn test_set_value_clears_selection() {
        let mut s = surface(&["hello"]);
        s.set_selection(Cursor::new(0, 5)).unwrap();
        s.set_value(vec![Block::paragraph(NodeId::from("z"), "")]);
        assert_eq!(s.selection(), None);
    }

    #[test]
    fn test_set_selection_out_of_range() {
        let mut s = surface(&["hi"]);
        assert!(matches!(
            s.set_selection(Cursor::new(0, 3)),
            Err(EditorError::SelectionOutOfRange { .. })
        ));
        assert!(matches!(
            s.set_selection(Cursor::new(1, 0)),
            Err(EditorError::SelectionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_insert_text_advances_cursor() {
        let mut s = surface(&["hllo"]);
        s.set_selection(Cursor::new(0, 1)).unwrap();
        s.insert_text("e").unwrap();
        assert_eq!(texts(&s), vec!["hello"]);
        assert_eq!(s.selection(), Some(Cursor::new(0, 2)));
    }

    #[test]
    fn test_insert_text_multibyte() {
        let mut s = surface(&["日本"]);
        s.set_selection(Cursor::new(0, 1)).unwrap();
        s.insert_text("の").unwrap();
        assert_eq!(texts(&s), vec!["日の本"]);
    }

    #[test]
    fn test_insert_break_duplicates_id() {
        let mut s = surface(&["helloworld"]);
        s.set_selection(Cursor::new(0, 5)).unwrap();
        s.insert_break().unwrap();
        assert_eq!(texts(&s), vec!["hello", "world"]);
        assert_eq!(s.value()[0].id, s.value()[1].id);
        assert_eq!(s.selection(), Some(Cursor::new(1, 0)));
    }

    #[test]
    fn test_insert_break_at_end_leaves_empty_tail() {
        let mut s = surface(&["hello"]);
        s.set_selection(Cursor::new(0, 5)).unwrap();
        s.insert_break().unwrap();
        assert_eq!(texts(&s), vec!["hello", ""]);
    }

    #[test]
    fn test_insert_break_in_nested_element() {
        let mut block = Block::paragraph(NodeId::from("n"), "");
        block.children = vec![
            DocNode::Element(Element::wrap(TextLeaf::new("ab"))),
            DocNode::Element(Element::wrap(TextLeaf::new("cd"))),
        ];
        let mut s = MemorySurface::with_value(vec![block]);
        s.set_selection(Cursor::new(0, 1)).unwrap();
        s.insert_break().unwrap();
        assert_eq!(texts(&s), vec!["a", "bcd"]);
        assert!(s.value()[1].children.iter().all(|c| !c.is_text()));
    }

    #[test]
    fn test_delete_backward_within_block() {
        let mut s = surface(&["abc"]);
        s.set_selection(Cursor::new(0, 2)).unwrap();
        s.delete_backward().unwrap();
        assert_eq!(texts(&s), vec!["ac"]);
        assert_eq!(s.selection(), Some(Cursor::new(0, 1)));
    }

    #[test]
    fn test_delete_backward_joins_blocks() {
        let mut s = surface(&["ab", "cd"]);
        s.set_selection(Cursor::new(1, 0)).unwrap();
        s.delete_backward().unwrap();
        assert_eq!(texts(&s), vec!["abcd"]);
        assert_eq!(s.value()[0].id, NodeId::from("b0"));
        assert_eq!(s.selection(), Some(Cursor::new(0, 2)));
    }

    #[test]
    fn test_delete_backward_at_start_is_noop() {
        let mut s = surface(&["ab"]);
        s.set_selection(Cursor::new(0, 0)).unwrap();
        s.delete_backward().unwrap();
        assert_eq!(texts(&s), vec!["ab"]);
    }

    #[test]
    fn test_line_before_cursor() {
        let mut s = surface(&["first\n```js tail"]);
        s.set_selection(Cursor::new(0, 11)).unwrap();
        assert_eq!(s.line_before_cursor().unwrap(), "```js");
    }

    #[test]
    fn test_cursor_clamped_after_value_shrinks() {
        let mut s = surface(&["hello", "world"]);
        s.set_selection(Cursor::new(1, 5)).unwrap();
        s.value_mut().truncate(1);
        s.value_mut()[0] = Block::paragraph(NodeId::from("b0"), "hi");
        assert_eq!(s.selection(), Some(Cursor::new(0, 2)));
    }

    #[test]
    fn test_insert_block_positions() {
        let mut s = surface(&["a", "b"]);
        s.insert_block(1, Block::paragraph(NodeId::from("mid"), "m")).unwrap();
        s.insert_block(3, Block::paragraph(NodeId::from("end"), "e")).unwrap();
        assert_eq!(texts(&s), vec!["a", "m", "b", "e"]);
        assert_eq!(s.selection(), Some(Cursor::new(3, 0)));
        assert_eq!(
            s.insert_block(9, Block::paragraph(NodeId::from("x"), "")),
            Err(EditorError::NoSuchBlock(9))
        );
    }

    #[test]
    fn test_replace_block_missing() {
        let mut s = surface(&["a"]);
        assert_eq!(
            s.replace_block(3, Block::paragraph(NodeId::from("x"), "")),
            Err(EditorError::NoSuchBlock(3))
        );
    }
}
