//! Code normalization.

/// Normalizes extracted code text.
pub trait CodeFormatter: Send + Sync {
    /// Language this formatter targets (matches a descriptor's `language`).
    fn language(&self) -> &str;

    fn format(&self, code: &str) -> String;
}

/// Indentation width emitted per depth level.
const INDENT: &str = "    ";

/// Whitespace and indentation normalizer for Python-shaped code.
///
/// - runs of blank (or whitespace-only) lines collapse to one empty line;
/// - every other line is trimmed and re-indented at `depth × 4` spaces;
/// - depth increases after any line ending in `:`.
///
/// Depth never decreases. Code that dedents after a block (a second
/// function, an `else:` branch) comes out over-indented. Use the formatter
/// for shallow snippets or replace it through
/// [`ResponseProcessor::with_formatter`](super::ResponseProcessor::with_formatter).
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonFormatter;

impl CodeFormatter for PythonFormatter {
    fn language(&self) -> &str {
        "python"
    }

    fn format(&self, code: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut depth = 0usize;
        let mut previous_blank = false;

        for line in code.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                if !previous_blank {
                    out.push(String::new());
                }
                previous_blank = true;
                continue;
            }
            previous_blank = false;

            out.push(format!("{}{stripped}", INDENT.repeat(depth)));
            if stripped.ends_with(':') {
                depth += 1;
            }
        }

        out.join("\n")
    }
}
