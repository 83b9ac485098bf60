//! Writing compiled artifacts to disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::GeneratedArtifact;
use crate::{PromptcError, Result};

/// Output file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One file: `<out>/<stem>.<ext>`, tests appended after a comment header.
    Single,
    /// `<out>/src/<stem>.<ext>` plus `<out>/tests/test_<stem>.<ext>`.
    #[default]
    Split,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Single => "single",
            OutputFormat::Split => "split",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = PromptcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(OutputFormat::Single),
            "split" => Ok(OutputFormat::Split),
            other => Err(PromptcError::InvalidInput(format!(
                "unknown output format '{other}' (expected single or split)"
            ))),
        }
    }
}

/// File extension for a descriptor `language`.
pub fn extension_for(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "python" => "py",
        "rust" => "rs",
        "javascript" => "js",
        "typescript" => "ts",
        "go" => "go",
        "java" => "java",
        _ => "txt",
    }
}

/// Line comment marker for `language`.
fn comment_prefix(language: &str) -> &'static str {
    match extension_for(language) {
        "py" | "txt" => "#",
        _ => "//",
    }
}

/// Write `artifact` under `out_dir`, returning the paths written.
///
/// In split layout the test file is only written when the artifact
/// carries tests.
pub fn write_artifact(
    artifact: &GeneratedArtifact,
    out_dir: &Path,
    stem: &str,
    language: &str,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    let ext = extension_for(language);
    let mut written = Vec::new();

    match format {
        OutputFormat::Single => {
            fs::create_dir_all(out_dir)?;
            let path = out_dir.join(format!("{stem}.{ext}"));
            let content = match &artifact.tests {
                Some(tests) => format!(
                    "{}\n\n{} Tests\n{tests}",
                    artifact.code,
                    comment_prefix(language)
                ),
                None => artifact.code.clone(),
            };
            fs::write(&path, content)?;
            written.push(path);
        }
        OutputFormat::Split => {
            let src_dir = out_dir.join("src");
            fs::create_dir_all(&src_dir)?;
            let path = src_dir.join(format!("{stem}.{ext}"));
            fs::write(&path, &artifact.code)?;
            written.push(path);

            if let Some(tests) = &artifact.tests {
                let test_dir = out_dir.join("tests");
                fs::create_dir_all(&test_dir)?;
                let path = test_dir.join(format!("test_{stem}.{ext}"));
                fs::write(&path, tests)?;
                written.push(path);
            }
        }
    }

    debug!(files = written.len(), %format, out_dir = %out_dir.display(), "artifact written");
    Ok(written)
}
