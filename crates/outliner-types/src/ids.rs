//! Node identifiers and the identifier generator.
//!
//! A [`NodeId`] is an opaque string token. Freshly generated ids are UUIDv4 in
//! simple (32 hex chars, no hyphens) form, but ids loaded from a dump are taken
//! verbatim: nothing in the outliner parses or orders them. The `short()` form
//! (first 8 chars) is for human-facing output only, never a lookup key.
//!
//! Ids are generated once per node and never recomputed from content. The
//! [`IdGenerator`] trait is the seam that lets the reducer and normalizer mint
//! ids without sharing a counter; [`RandomIds`] is the stateless production
//! implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a tree node, shared with its [`Block`](crate::Block) while the
/// node is under edit.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing token. Used for ids that arrive from a dump or a test.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh collision-resistant id (UUIDv4, simple form).
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().as_simple().to_string())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for human display only. Not a lookup key.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }

    /// Check if a query string matches this id by prefix.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}

// ── Generation ──────────────────────────────────────────────────────────────

/// Source of fresh node ids.
///
/// Implementations must never hand out the same id twice within a process.
/// They are owned by whoever mints ids (reducer, normalizer), so no state is
/// shared between two generators.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Stateless random generator (UUIDv4).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> NodeId {
        NodeId::random()
    }
}

impl<F> IdGenerator for F
where
    F: FnMut() -> NodeId,
{
    fn next_id(&mut self) -> NodeId {
        self()
    }
}

// ── Prefix resolution ───────────────────────────────────────────────────────

/// Error from prefix resolution.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("no match for prefix '{0}'")]
    NoMatch(String),
    #[error("ambiguous prefix '{prefix}': matches {candidates:?}")]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },
}

/// Resolve a query string against a set of node ids.
///
/// Resolution order:
/// 1. Exact id match
/// 2. Unique prefix match
/// 3. Error (no match or ambiguous)
pub fn resolve_prefix<'a>(
    ids: impl IntoIterator<Item = &'a NodeId>,
    query: &str,
) -> Result<NodeId, PrefixError> {
    let entries: Vec<&NodeId> = ids.into_iter().collect();

    if let Some(exact) = entries.iter().find(|id| id.as_str() == query) {
        return Ok((*exact).clone());
    }

    let matches: Vec<&NodeId> = entries
        .into_iter()
        .filter(|id| id.matches_prefix(query))
        .collect();

    match matches.len() {
        0 => Err(PrefixError::NoMatch(query.to_string())),
        1 => Ok(matches[0].clone()),
        _ => Err(PrefixError::Ambiguous {
            prefix: query.to_string(),
            candidates: matches.iter().map(|id| id.short().to_string()).collect(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_is_unique() {
        let a = NodeId::random();
        let b = NodeId::random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_is_32_hex_chars() {
        let id = NodeId::random();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_truncates() {
        let id = NodeId::from("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        let tiny = NodeId::from("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn test_serde_is_transparent_string() {
        let id = NodeId::from("node-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"node-1\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_closure_generator() {
        let mut n = 0;
        let mut ids = move || {
            n += 1;
            NodeId::from_string(format!("gen-{n}"))
        };
        assert_eq!(ids.next_id().as_str(), "gen-1");
        assert_eq!(ids.next_id().as_str(), "gen-2");
    }

    #[test]
    fn test_random_generator_many_unique() {
        let mut ids = RandomIds;
        let set: std::collections::HashSet<NodeId> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(set.len(), 1000);
    }

    // ── Prefix resolution ───────────────────────────────────────────────

    #[test]
    fn test_resolve_exact_wins_over_prefix() {
        let ids = [NodeId::from("ab"), NodeId::from("abc")];
        assert_eq!(resolve_prefix(&ids, "ab").unwrap(), NodeId::from("ab"));
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let ids = [NodeId::from("abc123"), NodeId::from("def456")];
        assert_eq!(resolve_prefix(&ids, "de").unwrap(), NodeId::from("def456"));
    }

    #[test]
    fn test_resolve_ambiguous() {
        let ids = [NodeId::from("abc123"), NodeId::from("abd456")];
        let err = resolve_prefix(&ids, "ab").unwrap_err();
        assert!(matches!(err, PrefixError::Ambiguous { .. }));
    }

    #[test]
    fn test_resolve_no_match() {
        let ids = [NodeId::from("abc123")];
        assert_eq!(
            resolve_prefix(&ids, "zz").unwrap_err(),
            PrefixError::NoMatch("zz".to_string())
        );
    }
}
