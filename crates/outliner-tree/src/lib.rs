//! Node tree, document normalizer and sync reducer for the outliner.
//!
//! The outliner shows one level of a tree at a time. The editing surface holds
//! the children of the *current node* as a flat list of blocks; the tree store
//! keeps every node ever committed, keyed by id.
//!
//! # Data flow
//!
//! ```text
//!   surface value ──normalize──▶ batch ──Merge{target}──▶ Reducer ──▶ State
//!        ▲                                                              │
//!        └──────────── children of new current node ◀───────────────────┘
//! ```
//!
//! # Invariants
//!
//! - Exactly one root: the only node with no parent and no data.
//! - Every child id resolves, and the child's `parent` points back.
//! - Every reachable node appears in exactly one `children` list.
//! - `current_node` always resolves.
//!
//! Merge does not delete nodes it drops from a `children` list. They become
//! unreachable and stay in the map until [`Reducer::sweep`] removes them.

pub mod code_fence;
mod error;
pub mod normalize;
mod reducer;
mod state;
mod tree;

pub use code_fence::{Fence, apply_fence, current_line, detect_fence};
pub use error::TreeError;
pub use normalize::{NormalizeReport, Normalizer, TOP_LEVEL_DEPTH, check_block, normalize_batch, normalize_block};
pub use reducer::{Action, Reducer, Transition, reduce};
pub use state::State;
pub use tree::{MAX_TREE_DEPTH, Tree, TreeNode};

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
