//! Process-wide outliner state and its textual dump.
//!
//! # Dump format
//!
//! ```text
//! {
//!   "tree": {
//!     "<id>": { "data": null | Block, "parent": null | "<id>", "children": ["<id>", ...] },
//!     ...
//!   },
//!   "currentNode": "<id>"
//! }
//! ```
//!
//! Stored blocks carry no `id` (the map key is the identity) and no `depth`.
//! The root is not recorded; it is the single node whose `parent` is null.

use outliner_types::{BlockData, IdGenerator, NodeId};
use serde::{Deserialize, Serialize};

use crate::tree::{Tree, TreeNode};
use crate::{Result, TreeError};

/// The tree plus the focus node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub tree: Tree,
    pub current_node: NodeId,
    root: NodeId,
}

#[derive(Serialize, Deserialize)]
struct StateDump {
    tree: Tree,
    #[serde(rename = "currentNode")]
    current_node: NodeId,
}

impl State {
    /// Fresh state: a root with one empty paragraph child, focused on the root.
    pub fn initial(ids: &mut dyn IdGenerator) -> Self {
        let root = ids.next_id();
        let mut tree = Tree::new();
        tree.insert(root.clone(), TreeNode::root());

        let child = tree.fresh_id(ids);
        tree.insert(
            child.clone(),
            TreeNode::leaf(BlockData::empty_paragraph(), root.clone()),
        );
        tree.insert(
            root.clone(),
            TreeNode {
                children: vec![child],
                ..TreeNode::root()
            },
        );

        Self {
            tree,
            current_node: root.clone(),
            root,
        }
    }

    /// Assemble a state from parts, deriving and validating the root.
    pub fn from_parts(tree: Tree, current_node: NodeId) -> Result<Self> {
        let root = {
            let mut roots = tree.iter().filter(|(_, node)| node.is_root()).map(|(id, _)| id);
            match (roots.next(), roots.next()) {
                (Some(root), None) => root.clone(),
                (None, _) => return Err(TreeError::Deserialization("no root node".into())),
                (Some(_), Some(_)) => {
                    return Err(TreeError::Deserialization("more than one root node".into()));
                }
            }
        };

        let state = Self {
            tree,
            current_node,
            root,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn root(&self) -> &NodeId {
        &self.root
    }

    /// The focus node.
    pub fn current(&self) -> Result<&TreeNode> {
        self.tree.get(&self.current_node)
    }

    /// Check tree connectivity and that the focus is reachable.
    pub fn validate(&self) -> Result<()> {
        self.tree
            .check_connectivity(&self.root)
            .map_err(|e| TreeError::Deserialization(e.to_string()))?;
        if !self.tree.is_reachable(&self.root, &self.current_node) {
            return Err(TreeError::Deserialization(format!(
                "current node {} is not reachable from the root",
                self.current_node
            )));
        }
        Ok(())
    }

    /// Serialize to the dump format.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let dump = StateDumpRef {
            tree: &self.tree,
            current_node: &self.current_node,
        };
        let text = if pretty {
            serde_json::to_string_pretty(&dump)
        } else {
            serde_json::to_string(&dump)
        };
        text.map_err(|e| TreeError::Serialization(e.to_string()))
    }

    /// Parse and validate a dump. Any failure is `Deserialization`.
    pub fn from_json(text: &str) -> Result<Self> {
        let dump: StateDump = serde_json::from_str(text)?;
        Self::from_parts(dump.tree, dump.current_node)
    }
}

#[derive(Serialize)]
struct StateDumpRef<'a> {
    tree: &'a Tree,
    #[serde(rename = "currentNode")]
    current_node: &'a NodeId,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use outliner_types::RandomIds;

    #[test]
    fn test_initial_state_shape() {
        let state = State::initial(&mut RandomIds);
        assert_eq!(state.tree.len(), 2);
        assert_eq!(&state.current_node, state.root());

        let root = state.current().unwrap();
        assert!(root.data.is_none());
        assert_eq!(root.children.len(), 1);

        let child = state.tree.get(&root.children[0]).unwrap();
        assert_eq!(child.parent.as_ref(), Some(state.root()));
        assert_eq!(child.data, Some(BlockData::empty_paragraph()));
        state.validate().unwrap();
    }

    #[test]
    fn test_initial_state_with_sequential_ids() {
        let mut n = 0;
        let mut ids = move || {
            n += 1;
            NodeId::from_string(format!("n{n}"))
        };
        let state = State::initial(&mut ids);
        assert_eq!(state.root(), &NodeId::from("n1"));
        assert_eq!(state.current().unwrap().children, vec![NodeId::from("n2")]);
        state.validate().unwrap();
    }

    #[test]
    fn test_from_parts_derives_root() {
        let state = State::initial(&mut RandomIds);
        let rebuilt = State::from_parts(state.tree.clone(), state.current_node.clone()).unwrap();
        assert_eq!(rebuilt.root(), state.root());
        assert_eq!(rebuilt, state);
    }

    #[test]
    fn test_dump_load_roundtrip() {
        let state = State::initial(&mut RandomIds);
        let text = state.to_json(true).unwrap();
        assert!(text.contains("currentNode"));
        let loaded = State::from_json(&text).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_dump_and_load_errors_are_distinct() {
        let dump = TreeError::Serialization("boom".into());
        assert_eq!(dump.to_string(), "cannot dump state: boom");
        let load = State::from_json("{").unwrap_err();
        assert!(load.to_string().starts_with("cannot load state"));
    }

    #[test]
    fn test_load_rejects_non_json() {
        let err = State::from_json("not json at all").unwrap_err();
        assert!(matches!(err, TreeError::Deserialization(_)));
    }

    #[test]
    fn test_load_rejects_missing_current() {
        let text = r#"{"tree":{"r":{"data":null,"parent":null,"children":[]}},"currentNode":"zz"}"#;
        assert!(matches!(State::from_json(text), Err(TreeError::Deserialization(_))));
    }

    #[test]
    fn test_load_rejects_two_roots() {
        let text = r#"{"tree":{
            "r1":{"data":null,"parent":null,"children":[]},
            "r2":{"data":null,"parent":null,"children":[]}
        },"currentNode":"r1"}"#;
        assert!(matches!(State::from_json(text), Err(TreeError::Deserialization(_))));
    }

    #[test]
    fn test_load_rejects_dangling_child() {
        let text = r#"{"tree":{"r":{"data":null,"parent":null,"children":["ghost"]}},"currentNode":"r"}"#;
        assert!(matches!(State::from_json(text), Err(TreeError::Deserialization(_))));
    }

    #[test]
    fn test_load_accepts_hand_written_dump() {
        let text = r#"{
            "tree": {
                "r": {"data": null, "parent": null, "children": ["c"]},
                "c": {"data": {"type": "paragraph", "children": [{"text": "hello"}]},
                      "parent": "r", "children": []}
            },
            "currentNode": "r"
        }"#;
        let state = State::from_json(text).unwrap();
        assert_eq!(state.root(), &NodeId::from("r"));
        let c = state.tree.get(&NodeId::from("c")).unwrap();
        assert_eq!(c.data, Some(BlockData::paragraph("hello")));
    }
}
