//! Document normalization for the local batch.
//!
//! Runs synchronously after every local edit and restores the structural
//! invariants of the editable document before the next render. Idempotent:
//! normalizing an already-normalized batch changes nothing.
//!
//! # Rules
//!
//! 1. **Depth tagging**: top-level blocks are depth 1, each nested element one
//!    deeper. Leaves carry no depth.
//! 2. **Homogeneity**: an element's children are either all leaves or all
//!    elements. Leaves found next to elements are wrapped in a paragraph.
//! 3. **Leaf cleanup**, one left-to-right pass with a self-adjusting cursor:
//!    - adjacent leaves that are loosely equal collapse into one
//!    - an empty leaf followed by a non-empty leaf is dropped
//!    - a trailing empty leaf with a preceding sibling is dropped
//!
//!    An element left without children receives a single empty leaf, so every
//!    block keeps a place for the cursor.
//! 4. **Split-id disambiguation** (batch level): when adjacent blocks share an
//!    id (a split duplicates it), every block after the first gets a fresh id.
//!
//! Code-fence detection is keystroke-driven and lives in
//! [`code_fence`](crate::code_fence).

use std::collections::HashSet;

use outliner_types::{Block, DocNode, Element, IdGenerator, NodeId, TextLeaf};

use crate::{Result, TreeError};

/// Depth of blocks at the top of the batch.
pub const TOP_LEVEL_DEPTH: usize = 1;

/// What a batch pass changed. Purely diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// `(old, new)` for every block whose id was reassigned.
    pub reassigned: Vec<(NodeId, NodeId)>,
}

/// Normalizer bound to an id generator, for callers that normalize on every
/// keystroke.
pub struct Normalizer {
    ids: Box<dyn IdGenerator>,
}

impl Normalizer {
    pub fn new(ids: impl IdGenerator + 'static) -> Self {
        Self { ids: Box::new(ids) }
    }

    /// Run rules 1–4 over the batch. `taken` reports ids that already exist
    /// outside the batch (e.g. in the tree) and must not be handed out.
    pub fn normalize(
        &mut self,
        batch: &mut [Block],
        taken: impl Fn(&NodeId) -> bool,
    ) -> NormalizeReport {
        normalize_batch(batch, self.ids.as_mut(), taken)
    }

    /// Draw an id that `used` does not reject.
    pub fn fresh_id(&mut self, used: impl Fn(&NodeId) -> bool) -> NodeId {
        draw_unused(self.ids.as_mut(), used)
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer").finish_non_exhaustive()
    }
}

/// Normalize every block, then disambiguate split ids.
pub fn normalize_batch(
    batch: &mut [Block],
    ids: &mut dyn IdGenerator,
    taken: impl Fn(&NodeId) -> bool,
) -> NormalizeReport {
    for block in batch.iter_mut() {
        normalize_block(block);
    }
    disambiguate_split_ids(batch, ids, taken)
}

/// Apply rules 1–3 to a single block.
pub fn normalize_block(block: &mut Block) {
    block.depth = TOP_LEVEL_DEPTH;
    normalize_children(&mut block.children, TOP_LEVEL_DEPTH + 1);
}

fn normalize_children(children: &mut Vec<DocNode>, child_depth: usize) {
    wrap_mixed_leaves(children);

    for child in children.iter_mut() {
        if let DocNode::Element(el) = child {
            el.depth = child_depth;
            normalize_children(&mut el.children, child_depth + 1);
        }
    }

    clean_adjacent_leaves(children);

    if children.is_empty() {
        children.push(DocNode::Text(TextLeaf::default()));
    }
}

fn wrap_mixed_leaves(children: &mut [DocNode]) {
    let has_element = children.iter().any(|c| !c.is_text());
    let has_leaf = children.iter().any(DocNode::is_text);
    if !(has_element && has_leaf) {
        return;
    }
    for child in children.iter_mut() {
        if let DocNode::Text(leaf) = child {
            *child = DocNode::Element(Element::wrap(std::mem::take(leaf)));
        }
    }
}

fn clean_adjacent_leaves(children: &mut Vec<DocNode>) {
    let mut n = 1;
    while n < children.len() {
        let (DocNode::Text(prev), DocNode::Text(cur)) = (&children[n - 1], &children[n]) else {
            n += 1;
            continue;
        };

        if prev.loose_eq(cur) {
            children.remove(n);
            // the survivor may now be a trailing empty leaf
            n = (n - 1).max(1);
        } else if prev.is_empty() {
            children.remove(n - 1);
            // the leaf that slid into n - 1 needs comparing with its new left neighbour
            n = (n - 1).max(1);
        } else if cur.is_empty() && n == children.len() - 1 {
            children.remove(n);
        } else {
            n += 1;
        }
    }
}

/// Rule 4. Compares each block with the *original* id of its left neighbour,
/// so a run of three copies yields three distinct ids.
pub fn disambiguate_split_ids(
    batch: &mut [Block],
    ids: &mut dyn IdGenerator,
    taken: impl Fn(&NodeId) -> bool,
) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let mut prev_original: Option<NodeId> = None;

    for i in 0..batch.len() {
        let original = batch[i].id.clone();
        if prev_original.as_ref() == Some(&original) {
            let in_batch: HashSet<NodeId> = batch.iter().map(|b| b.id.clone()).collect();
            let fresh = draw_unused(ids, |id| in_batch.contains(id) || taken(id));
            tracing::debug!(old = %original, new = %fresh, "split block gets fresh id");
            batch[i].id = fresh.clone();
            report.reassigned.push((original.clone(), fresh));
        }
        prev_original = Some(original);
    }

    report
}

/// Draw ids until `used` rejects none.
pub(crate) fn draw_unused(ids: &mut dyn IdGenerator, used: impl Fn(&NodeId) -> bool) -> NodeId {
    loop {
        let id = ids.next_id();
        if !used(&id) {
            return id;
        }
    }
}

/// Verify the homogeneity invariant on a block.
///
/// Fails with `MalformedBatch` naming the first offending element.
pub fn check_block(block: &Block) -> Result<()> {
    if let Some(reason) = find_mixed(&block.children, "block") {
        return Err(TreeError::MalformedBatch {
            id: block.id.clone(),
            reason,
        });
    }
    Ok(())
}

fn find_mixed(children: &[DocNode], path: &str) -> Option<String> {
    let has_element = children.iter().any(|c| !c.is_text());
    let has_leaf = children.iter().any(DocNode::is_text);
    if has_element && has_leaf {
        return Some(format!("{path} mixes text leaves with elements"));
    }
    children.iter().enumerate().find_map(|(i, child)| match child {
        DocNode::Element(el) => find_mixed(&el.children, &format!("{path}/{i}")),
        DocNode::Text(_) => None,
    })
}

// ============================================================================
// Tests
// ============================================================================
