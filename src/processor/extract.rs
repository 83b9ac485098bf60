//! Fenced code block extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Opening fence with optional info string, lazily matched body, closing fence.
///
/// Both fences must start a line (after optional indentation); backticks
/// inside prose never open a block. The body may be empty.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```[^\n`]*\n((?s:.*?))\n?^[ \t]*```")
        .expect("fenced block pattern is valid")
});

/// Return the body of the first fenced code block in `text`, or `text`
/// unchanged when it has none.
///
/// The language tag on the opening fence (`python`, `rust`, ...) is
/// ignored. The body is returned verbatim, without the fence lines.
pub fn extract_code(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |body| body.as_str())
}
