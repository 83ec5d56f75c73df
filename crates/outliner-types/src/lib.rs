//! Shared identity and block types for the outliner.
//!
//! This crate is the leaf of the workspace: node identifiers, the identifier
//! generator, and the rich-text block model. It has **no internal outliner
//! dependencies**.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`NodeId`]        | Opaque node identity (tree key = block id)   |
//! | [`IdGenerator`]   | Source of fresh ids                          |
//! | [`BlockData`]     | Persisted block content (no id, no depth)    |
//! | [`Block`]         | Block under edit (id + content + depth)      |
//! | [`DocNode`]       | Leaf or sub-element inside a block           |
//! |-------------------|----------------------------------------------|

pub mod block;
pub mod ids;

pub use block::{Block, BlockData, BlockKind, DocNode, Element, TextLeaf};
pub use ids::{IdGenerator, NodeId, PrefixError, RandomIds, resolve_prefix};
