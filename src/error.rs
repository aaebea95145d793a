//! Stage and pipeline error types.
//!
//! Every failure is fatal to the stage that raised it; the orchestrator wraps
//! it in [`PipelineError`] together with the stage name and stops the run.

use std::fmt;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use crate::asset::AssetClass;
use crate::pipeline::StageName;

/// Errors raised while scanning, transforming or writing one stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Source failed a style/correctness check.
    #[error("lint failed for `{}`:\n{}", path.display(), Messages(messages))]
    LintViolation { path: PathBuf, messages: Vec<String> },

    /// An external transform rejected malformed input.
    #[error("{transform} failed on `{}`: {message}", path.display())]
    TransformFailure {
        transform: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("IO error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A singular (non-glob) source pattern names a missing file.
    #[error("file not found with singular glob `{pattern}`")]
    NotFound { pattern: String },

    #[error("invalid glob `{pattern}`")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Two manifests map the same original path to different outputs.
    #[error("manifest key `{key}` maps to both `{first}` and `{second}`")]
    ManifestConflict {
        key: String,
        first: String,
        second: String,
    },

    #[error("manifest `{manifest}` is already flushed")]
    ManifestSealed { manifest: &'static str },

    #[error("asset class `{class}` does not produce a manifest")]
    NoManifest { class: AssetClass },

    /// The output root is the project root or one of its ancestors.
    #[error("refusing to clean `{}`: it contains the project root", path.display())]
    UnsafeClean { path: PathBuf },
}

impl StageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn transform(
        transform: &'static str,
        path: impl Into<PathBuf>,
        message: impl fmt::Display,
    ) -> Self {
        Self::TransformFailure {
            transform,
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Lint messages, one per line with a bullet.
struct Messages<'a>(&'a [String]);

impl fmt::Display for Messages<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {} {message}", "→".red())?;
        }
        Ok(())
    }
}

/// A stage failure, tagged with the stage that halted the run.
#[derive(Debug, Error)]
#[error("stage `{stage}` failed")]
pub struct PipelineError {
    pub stage: StageName,
    #[source]
    pub source: StageError,
}
