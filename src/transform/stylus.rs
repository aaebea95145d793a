//! Stylus compilation through an external compiler.

use std::path::PathBuf;

use crate::asset::AssetFile;
use crate::error::StageError;
use crate::stage::StageContext;
use crate::utils::exec::{Cmd, resolve_args};

use super::{Transform, require_text};

/// Compile `.styl` sources to CSS.
///
/// The source goes in on stdin and the compiled CSS is read from stdout.
/// `$FILE` and `$DIR` in the command expand to the source path and its
/// directory, so `@import` resolves relative to the file.
#[derive(Debug, Clone)]
pub struct StylusCompile {
    command: Vec<String>,
    root: PathBuf,
}

impl StylusCompile {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            root: PathBuf::from("."),
        }
    }
}

impl Transform for StylusCompile {
    fn name(&self) -> &'static str {
        "stylus"
    }

    /// Fails early when the compiler is not installed.
    fn prepare(&mut self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        self.root = ctx.root.to_path_buf();
        match self.command.first() {
            Some(program) if which::which(program).is_ok() => Ok(()),
            Some(program) => Err(StageError::transform(
                self.name(),
                program,
                "command not found, install it or set `tools.stylus.command`",
            )),
            None => Err(StageError::transform(self.name(), "", "empty command")),
        }
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let source = require_text(&file, self.name())?;
        let args = resolve_args(&self.command, &file.source);

        let output = Cmd::from_slice(&args)
            .cwd(&self.root)
            .stdin(source)
            .run()
            .map_err(|e| StageError::transform(self.name(), &file.source, format!("{e:#}")))?;

        let css = String::from_utf8(output.stdout).map_err(|_| {
            StageError::transform(self.name(), &file.source, "compiler output is not valid UTF-8")
        })?;
        file.set_text(css);
        file.set_extension("css");
        Ok(file)
    }
}
