//! The tree store: canonical mapping from [`NodeId`] to [`TreeNode`].
//!
//! The tree is a single rooted tree. Every reachable non-root node's `parent`
//! names the node whose `children` lists it, child ids always resolve, and
//! there are no cycles. Nodes that a merge drops from their parent's
//! `children` stay in the map but become unreachable; they are garbage until
//! [`Tree::sweep_unreachable`] runs.

use std::collections::{HashMap, HashSet, VecDeque};

use outliner_types::{BlockData, IdGenerator, NodeId};
use serde::{Deserialize, Serialize};

use crate::{Result, TreeError};

/// Maximum expected tree depth. Traversal code uses this as a circuit breaker.
///
/// Outlines rarely go beyond a few dozen levels; exceeding this likely
/// indicates a cycle or corruption in a loaded dump.
pub const MAX_TREE_DEPTH: usize = 512;

/// A persistent entry in the outline tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Content; `None` only for the root.
    pub data: Option<BlockData>,
    /// Parent node; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Ordered children (insertion order = display order).
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn root() -> Self {
        Self {
            data: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(data: BlockData, parent: NodeId) -> Self {
        Self {
            data: Some(data),
            parent: Some(parent),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Mapping NodeId → TreeNode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    nodes: HashMap<NodeId, TreeNode>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the map, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &TreeNode)> {
        self.nodes.iter()
    }

    /// Look up a node. Fails with `NotFound` if the id is absent.
    pub fn get(&self, id: &NodeId) -> Result<&TreeNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &NodeId) -> Result<&mut TreeNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    /// Insert a node verbatim. Used to seed roots and by tests.
    pub fn insert(&mut self, id: NodeId, node: TreeNode) {
        self.nodes.insert(id, node);
    }

    /// Allocate a fresh id and append a new child under `parent_id`.
    pub fn create_child(
        &mut self,
        parent_id: &NodeId,
        initial: BlockData,
        ids: &mut dyn IdGenerator,
    ) -> Result<NodeId> {
        if !self.contains(parent_id) {
            return Err(TreeError::NotFound(parent_id.clone()));
        }
        let id = self.fresh_id(ids);
        self.nodes
            .insert(id.clone(), TreeNode::leaf(initial, parent_id.clone()));
        self.get_mut(parent_id)?.children.push(id.clone());
        Ok(id)
    }

    /// Replace a node's children. The ids are not validated here; the reducer
    /// guarantees they resolve by upserting every one of them.
    pub fn set_children(&mut self, id: &NodeId, children: Vec<NodeId>) -> Result<()> {
        self.get_mut(id)?.children = children;
        Ok(())
    }

    /// Replace an existing node's data, or insert a new childless node.
    ///
    /// Returns `true` when a new node was inserted.
    pub fn upsert(&mut self, id: NodeId, data: BlockData, parent_id: &NodeId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.data = Some(data);
                false
            }
            None => {
                self.nodes.insert(id, TreeNode::leaf(data, parent_id.clone()));
                true
            }
        }
    }

    /// Draw ids until one is not already in the map.
    pub fn fresh_id(&self, ids: &mut dyn IdGenerator) -> NodeId {
        loop {
            let id = ids.next_id();
            if !self.contains(&id) {
                return id;
            }
            tracing::warn!("id generator produced existing id {}, drawing again", id);
        }
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Ancestors of a node, from immediate parent up to the root.
    ///
    /// Circuit-breaks at `MAX_TREE_DEPTH`.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.nodes.get(id);

        while let Some(node) = current {
            if result.len() >= MAX_TREE_DEPTH {
                tracing::warn!("ancestors() hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating");
                break;
            }
            match &node.parent {
                Some(parent_id) => {
                    result.push(parent_id.clone());
                    current = self.nodes.get(parent_id);
                }
                None => break,
            }
        }

        result
    }

    /// All ids reachable from `root` through `children` links (root included).
    pub fn reachable(&self, root: &NodeId) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                queue.extend(node.children.iter().cloned());
            }
        }

        visited.retain(|id| self.nodes.contains_key(id));
        visited
    }

    pub fn is_reachable(&self, root: &NodeId, id: &NodeId) -> bool {
        self.reachable(root).contains(id)
    }

    /// Verify the tree invariants over everything reachable from `root`.
    ///
    /// Unreachable nodes (merge garbage) are ignored. Returns the first
    /// violation found.
    pub fn check_connectivity(&self, root: &NodeId) -> Result<()> {
        let root_node = self.get(root)?;
        if root_node.parent.is_some() {
            return Err(TreeError::Inconsistent(format!("root {root} has a parent")));
        }

        let mut visited = HashSet::from([root.clone()]);
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(id) = queue.pop_front() {
            let node = self.get(&id)?;
            for child_id in &node.children {
                let Some(child) = self.nodes.get(child_id) else {
                    return Err(TreeError::Inconsistent(format!(
                        "{id} lists missing child {child_id}"
                    )));
                };
                if !visited.insert(child_id.clone()) {
                    return Err(TreeError::Inconsistent(format!(
                        "{child_id} is listed more than once (duplicate parentage or cycle)"
                    )));
                }
                if child.parent.as_ref() != Some(&id) {
                    return Err(TreeError::Inconsistent(format!(
                        "{child_id} is listed under {id} but its parent is {:?}",
                        child.parent
                    )));
                }
                if child.data.is_none() {
                    return Err(TreeError::Inconsistent(format!("non-root {child_id} has no data")));
                }
                queue.push_back(child_id.clone());
            }
        }

        Ok(())
    }

    /// Remove every node not reachable from `root`. Returns how many went.
    pub fn sweep_unreachable(&mut self, root: &NodeId) -> usize {
        let keep = self.reachable(root);
        let before = self.nodes.len();
        self.nodes.retain(|id, _| keep.contains(id));
        let swept = before - self.nodes.len();
        if swept > 0 {
            tracing::debug!(swept, "swept unreachable nodes");
        }
        swept
    }
}

// ============================================================================
// Tests
// ============================================================================
