//! Code-block detection from a typed fence marker.
//!
//! When the user finishes a line that consists of three backticks and an
//! optional language tag, the marker text is deleted and the block under the
//! cursor becomes an empty code block.

use std::sync::LazyLock;

use outliner_types::{Block, BlockKind, DocNode};
use regex::Regex;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```([A-Za-z0-9_+#.-]*)[ \t]*$").expect("fence pattern is valid")
});

/// A detected fence marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// Language tag after the backticks, if any.
    pub language: Option<String>,
}

/// Match the text of the current line (everything before the cursor back to
/// the previous newline or block start) against the fence pattern.
pub fn detect_fence(line: &str) -> Option<Fence> {
    let caps = FENCE.captures(line)?;
    let language = caps
        .get(1)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(Fence { language })
}

/// The text before the cursor on the cursor's line.
pub fn current_line(text_before_cursor: &str) -> &str {
    match text_before_cursor.rfind('\n') {
        Some(i) => &text_before_cursor[i + 1..],
        None => text_before_cursor,
    }
}

/// Turn `block` into an empty code block, keeping its identity.
pub fn apply_fence(block: &mut Block, fence: Fence) {
    tracing::debug!(block = %block.id, language = ?fence.language, "fence marker → code block");
    block.kind = BlockKind::Code;
    block.language = fence.language;
    block.children = vec![DocNode::text("")];
}
