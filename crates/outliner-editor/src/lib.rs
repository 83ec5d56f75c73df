//! Editing surface adapter and session for the outliner.
//!
//! This crate sits between a text-editing surface and the tree reducer:
//!
//! - [`EditingSurface`]: the capability a surface must offer (value, cursor,
//!   low-level edits). [`MemorySurface`] is the in-process implementation.
//! - [`SurfaceAdapter`]: maps key gestures onto the surface, normalizes the
//!   local batch after every edit, and turns push/pop into navigation requests.
//! - [`Session`]: owns the [`Reducer`](outliner_tree::Reducer), commits the
//!   local batch on navigation and notifies observers with a fresh [`View`].

mod adapter;
mod error;
mod memory;
mod session;
mod surface;

pub use adapter::{KeyGesture, NavigationRequest, SurfaceAdapter};
pub use error::EditorError;
pub use memory::MemorySurface;
pub use session::{Session, View};
pub use surface::{Cursor, EditingSurface};

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
