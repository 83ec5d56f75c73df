//! Rich-text blocks: the content of a tree node while it is stored and while
//! it is under edit.
//!
//! ## Two shapes of the same content
//!
//! - [`BlockData`] is what the tree stores. It carries no identity (the id is
//!   the tree's map key) and no presentation metadata.
//! - [`Block`] is what the editing surface works on. It carries the node's
//!   [`NodeId`] and a transient `depth` tag that the normalizer re-derives on
//!   every pass. `depth` is never serialized.
//!
//! A block's children form a small document tree of [`DocNode`]s: plain-text
//! leaves ([`TextLeaf`]) and anonymous sub-elements ([`Element`]). Well-formed
//! blocks hold either only leaves or only elements; the normalizer enforces
//! that.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::NodeId;

/// What a block *is*.
///
/// Deliberately small: plain paragraphs and code blocks are the only content
/// the editor produces. `Title` is the read-only rendering of the focus node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    /// Ordinary paragraph.
    #[default]
    #[strum(serialize = "paragraph", serialize = "p")]
    Paragraph,
    /// Preformatted code block, created by typing a fence marker.
    Code,
    /// Heading of the focus node.
    Title,
}

impl BlockKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Code => "code",
            BlockKind::Title => "title",
        }
    }

    /// Check if this block renders preformatted.
    pub fn is_code(&self) -> bool {
        matches!(self, BlockKind::Code)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Document nodes
// ============================================================================

/// A plain-text leaf. The only leaf content; carries no identity.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextLeaf {
    pub text: String,
}

impl TextLeaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Equality that ignores formatting. Leaves carry no marks, so this is
    /// text equality.
    pub fn loose_eq(&self, other: &TextLeaf) -> bool {
        self.text == other.text
    }
}

/// An anonymous structural sub-element inside a block.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    pub children: Vec<DocNode>,
    /// Nesting depth, tagged by the normalizer. Never persisted.
    #[serde(skip)]
    pub depth: usize,
}

impl Element {
    /// A paragraph element wrapping a single leaf.
    pub fn wrap(leaf: TextLeaf) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            children: vec![DocNode::Text(leaf)],
            depth: 0,
        }
    }
}

/// A node inside a block's document tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocNode {
    Element(Element),
    Text(TextLeaf),
}

impl DocNode {
    pub fn text(text: impl Into<String>) -> Self {
        DocNode::Text(TextLeaf::new(text))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DocNode::Text(_))
    }

    pub fn as_text(&self) -> Option<&TextLeaf> {
        match self {
            DocNode::Text(leaf) => Some(leaf),
            DocNode::Element(_) => None,
        }
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            DocNode::Text(leaf) => out.push_str(&leaf.text),
            DocNode::Element(el) => {
                for child in &el.children {
                    child.push_plain_text(out);
                }
            }
        }
    }
}

fn plain_text_of(children: &[DocNode]) -> String {
    let mut out = String::new();
    for child in children {
        child.push_plain_text(&mut out);
    }
    out
}

// ============================================================================
// Blocks
// ============================================================================

/// Persisted block content: what a tree node stores.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockData {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    /// Language tag of a code block (from the fence marker), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub children: Vec<DocNode>,
}

impl BlockData {
    /// A paragraph holding one leaf.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            language: None,
            children: vec![DocNode::text(text)],
        }
    }

    /// The placeholder content of a freshly materialized child.
    pub fn empty_paragraph() -> Self {
        Self::paragraph("")
    }

    /// Leaf text concatenated in document order.
    pub fn plain_text(&self) -> String {
        plain_text_of(&self.children)
    }
}

/// A block under edit: persisted content plus identity and depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub children: Vec<DocNode>,
    /// Nesting depth (top-level blocks are depth 1). Never persisted.
    #[serde(skip)]
    pub depth: usize,
}

impl Block {
    /// Attach an identity to stored content.
    pub fn from_data(id: NodeId, data: BlockData) -> Self {
        Self {
            id,
            kind: data.kind,
            language: data.language,
            children: data.children,
            depth: 0,
        }
    }

    /// Strip identity and depth for storage.
    pub fn into_data(self) -> BlockData {
        BlockData {
            kind: self.kind,
            language: self.language,
            children: self.children,
        }
    }

    pub fn paragraph(id: NodeId, text: impl Into<String>) -> Self {
        Self::from_data(id, BlockData::paragraph(text))
    }

    pub fn empty_paragraph(id: NodeId) -> Self {
        Self::from_data(id, BlockData::empty_paragraph())
    }

    /// Leaf text concatenated in document order.
    pub fn plain_text(&self) -> String {
        plain_text_of(&self.children)
    }
}

// ============================================================================
// Tests
// ============================================================================
