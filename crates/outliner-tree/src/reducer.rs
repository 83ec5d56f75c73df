//! The sync reducer: the only writer of [`State`].
//!
//! # Transitions
//!
//! ```text
//! Navigate(t)          current := t                       (t must exist)
//! EnsureChildren(n)    n childless → one empty paragraph  (idempotent)
//! AppendChild(n)       push an empty paragraph under n
//! Merge { t, batch }   current.children := ids(batch)
//!                      upsert every block under current
//!                      t in batch and childless → EnsureChildren(t)
//!                      current := t                       (t must stay reachable)
//! Load(s)              replace the whole state (s validated first)
//! ```
//!
//! Every transition runs against a staging copy of the state; the copy is
//! swapped in only when the transition succeeds, so a failed transition
//! leaves the state untouched.
//!
//! # Batch guard
//!
//! Merge trusts the normalizer upstream but still checks the batch before
//! committing it. Blocks that mix leaves and elements are normalized in place.
//! Blocks whose id is already used (twice in the batch, or by a node that is
//! not a child of the current node) get a fresh id, which keeps parentage
//! unique and rules out cycles. Both repairs are logged, never fatal.

use std::collections::HashSet;

use outliner_types::{Block, BlockData, IdGenerator, NodeId, RandomIds};

use crate::normalize::{self, draw_unused};
use crate::state::State;
use crate::{Result, TreeError};

/// Reducer input. Each variant carries exactly what its transition needs.
#[derive(Debug, Clone)]
pub enum Action {
    /// Move focus to an existing node.
    Navigate(NodeId),
    /// Give a childless node its placeholder child.
    EnsureChildren(NodeId),
    /// Append an empty paragraph child to a node.
    AppendChild(NodeId),
    /// Commit the local batch as the current node's children, then focus `target`.
    Merge { target: NodeId, batch: Vec<Block> },
    /// Replace the state wholesale.
    Load(Box<State>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Navigate(_) => "navigate",
            Action::EnsureChildren(_) => "ensure_children",
            Action::AppendChild(_) => "append_child",
            Action::Merge { .. } => "merge",
            Action::Load(_) => "load",
        }
    }
}

/// What a successful transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Focused {
        node: NodeId,
    },
    ChildrenEnsured {
        node: NodeId,
        /// The synthesized child, or `None` if the node already had children.
        created: Option<NodeId>,
    },
    ChildAppended {
        parent: NodeId,
        child: NodeId,
    },
    Merged {
        parent: NodeId,
        target: NodeId,
        created: Vec<NodeId>,
        updated: usize,
        /// Former children no longer referenced (now unreachable).
        dropped: Vec<NodeId>,
        /// Placeholder child synthesized for the target, if any.
        materialized: Option<NodeId>,
    },
    Loaded {
        nodes: usize,
    },
}

/// Apply one action to a copy of `state`.
///
/// Pure with respect to `state`: the input is never modified.
pub fn reduce(state: &State, action: Action, ids: &mut dyn IdGenerator) -> Result<(State, Transition)> {
    let mut staged = state.clone();
    let transition = apply(&mut staged, action, ids)?;
    Ok((staged, transition))
}

fn apply(state: &mut State, action: Action, ids: &mut dyn IdGenerator) -> Result<Transition> {
    match action {
        Action::Navigate(target) => {
            state.tree.get(&target)?;
            state.current_node = target.clone();
            Ok(Transition::Focused { node: target })
        }
        Action::EnsureChildren(node) => {
            let created = ensure_children(state, &node, ids)?;
            Ok(Transition::ChildrenEnsured { node, created })
        }
        Action::AppendChild(parent) => {
            let child = state
                .tree
                .create_child(&parent, BlockData::empty_paragraph(), ids)?;
            Ok(Transition::ChildAppended { parent, child })
        }
        Action::Merge { target, batch } => merge(state, target, batch, ids),
        Action::Load(loaded) => {
            loaded.validate()?;
            *state = *loaded;
            Ok(Transition::Loaded {
                nodes: state.tree.len(),
            })
        }
    }
}

fn ensure_children(
    state: &mut State,
    node: &NodeId,
    ids: &mut dyn IdGenerator,
) -> Result<Option<NodeId>> {
    if !state.tree.get(node)?.children.is_empty() {
        return Ok(None);
    }
    let child = state
        .tree
        .create_child(node, BlockData::empty_paragraph(), ids)?;
    tracing::debug!(node = %node, child = %child, "materialized placeholder child");
    Ok(Some(child))
}

fn merge(
    state: &mut State,
    target: NodeId,
    mut batch: Vec<Block>,
    ids: &mut dyn IdGenerator,
) -> Result<Transition> {
    let parent = state.current_node.clone();
    let old_children = state.tree.get(&parent)?.children.clone();

    guard_batch(state, &parent, &mut batch, ids);

    let target_in_batch = batch.iter().any(|b| b.id == target);

    let new_children: Vec<NodeId> = batch.iter().map(|b| b.id.clone()).collect();
    state.tree.set_children(&parent, new_children.clone())?;

    let mut created = Vec::new();
    let mut updated = 0;
    let mut materialized = None;

    for block in batch {
        let id = block.id.clone();
        if state.tree.upsert(id.clone(), block.into_data(), &parent) {
            created.push(id.clone());
        } else {
            updated += 1;
        }
        if id == target {
            materialized = ensure_children(state, &id, ids)?;
        }
    }

    if !target_in_batch && !state.tree.is_reachable(state.root(), &target) {
        return Err(TreeError::InvalidTarget(target));
    }

    let kept: HashSet<&NodeId> = new_children.iter().collect();
    let dropped: Vec<NodeId> = old_children
        .into_iter()
        .filter(|id| !kept.contains(id))
        .collect();

    state.current_node = target.clone();

    Ok(Transition::Merged {
        parent,
        target,
        created,
        updated,
        dropped,
        materialized,
    })
}

/// Best-effort repair of a batch that reached the reducer malformed.
fn guard_batch(state: &State, parent: &NodeId, batch: &mut [Block], ids: &mut dyn IdGenerator) {
    for block in batch.iter_mut() {
        if let Err(e) = normalize::check_block(block) {
            tracing::warn!("{e}; repairing before merge");
            normalize::normalize_block(block);
        }
    }

    // the parent and everything above it; reusing one of these ids would close a cycle
    let lineage: HashSet<NodeId> = std::iter::once(parent.clone())
        .chain(state.tree.ancestors(parent))
        .collect();

    let mut seen: HashSet<NodeId> = HashSet::new();
    for i in 0..batch.len() {
        let id = batch[i].id.clone();
        let reason = if seen.contains(&id) {
            Some("duplicate in batch")
        } else if lineage.contains(&id) {
            Some("would create a cycle")
        } else if state
            .tree
            .get(&id)
            .is_ok_and(|node| node.parent.as_ref() != Some(parent))
        {
            Some("belongs to another parent")
        } else {
            None
        };

        if let Some(reason) = reason {
            let in_batch: HashSet<NodeId> = batch.iter().map(|b| b.id.clone()).collect();
            let fresh = draw_unused(ids, |candidate| {
                in_batch.contains(candidate) || seen.contains(candidate) || state.tree.contains(candidate)
            });
            tracing::warn!(
                old = %id,
                new = %fresh,
                reason,
                "block id already in use, reassigning before merge"
            );
            batch[i].id = fresh;
        }
        seen.insert(batch[i].id.clone());
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Owner of the process-wide [`State`].
pub struct Reducer {
    state: State,
    ids: Box<dyn IdGenerator>,
}

impl Reducer {
    /// Fresh state (root + one empty child) with random ids.
    pub fn new() -> Self {
        Self::with_ids(RandomIds)
    }

    /// Fresh state drawing ids from `ids`.
    pub fn with_ids(ids: impl IdGenerator + 'static) -> Self {
        let mut ids: Box<dyn IdGenerator> = Box::new(ids);
        let state = State::initial(ids.as_mut());
        Self { state, ids }
    }

    /// Wrap an existing (already validated) state.
    pub fn from_state(state: State, ids: impl IdGenerator + 'static) -> Self {
        Self {
            state,
            ids: Box::new(ids),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn current_node(&self) -> &NodeId {
        &self.state.current_node
    }

    /// Run one transition. On error the state is unchanged.
    pub fn dispatch(&mut self, action: Action) -> Result<Transition> {
        let name = action.name();
        match reduce(&self.state, action, self.ids.as_mut()) {
            Ok((next, transition)) => {
                self.state = next;
                tracing::debug!(action = name, ?transition, "transition applied");
                Ok(transition)
            }
            Err(e) => {
                tracing::debug!(action = name, error = %e, "transition rejected");
                Err(e)
            }
        }
    }

    /// Parse a dump and replace the state. Invalid input leaves the state as is.
    pub fn load_json(&mut self, text: &str) -> Result<Transition> {
        let loaded = State::from_json(text)?;
        self.dispatch(Action::Load(Box::new(loaded)))
    }

    /// Drop nodes that merges left unreachable.
    pub fn sweep(&mut self) -> usize {
        let root = self.state.root().clone();
        self.state.tree.sweep_unreachable(&root)
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
