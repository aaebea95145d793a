//! JavaScript transforms backed by oxc: lint, transpile, minify.

use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::transformer::{TransformOptions, Transformer};

use crate::asset::AssetFile;
use crate::error::StageError;
use crate::stage::StageContext;
use crate::utils::exec::{Cmd, resolve_args};

use super::minify::{minify_js, script_source_type};
use super::{Transform, require_text};

// ============================================================================
// Lint
// ============================================================================

/// Reject scripts with syntax or semantic errors.
///
/// With a configured command (e.g. `["npx", "eslint"]`), it also runs once per
/// file with the source path appended; a non-zero exit is a violation.
#[derive(Debug, Clone, Default)]
pub struct Lint {
    command: Vec<String>,
    root: PathBuf,
}

impl Lint {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            root: PathBuf::from("."),
        }
    }

    /// Parser and semantic diagnostics of one source.
    pub fn check(source: &str, ext: Option<&str>) -> Vec<String> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, script_source_type(ext)).parse();
        if !ret.errors.is_empty() {
            return ret.errors.iter().map(ToString::to_string).collect();
        }
        SemanticBuilder::new()
            .with_check_syntax_error(true)
            .build(&ret.program)
            .errors
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn run_command(&self, source: &Path) -> Option<String> {
        if self.command.is_empty() {
            return None;
        }
        let mut resolved = resolve_args(&self.command, source);
        if !self.command.iter().any(|a| a.contains("$FILE")) {
            resolved.push(source.display().to_string());
        }
        Cmd::from_slice(&resolved)
            .cwd(&self.root)
            .run()
            .err()
            .map(|e| format!("{e:#}"))
    }
}

impl Transform for Lint {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn prepare(&mut self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        self.root = ctx.root.to_path_buf();
        Ok(())
    }

    fn apply(&self, file: AssetFile) -> Result<AssetFile, StageError> {
        let mut messages = Self::check(require_text(&file, self.name())?, file.extension());
        if messages.is_empty()
            && let Some(report) = self.run_command(&file.source)
        {
            messages.push(report);
        }

        if messages.is_empty() {
            Ok(file)
        } else {
            Err(StageError::LintViolation {
                path: file.source,
                messages,
            })
        }
    }
}

// ============================================================================
// Transpile
// ============================================================================

/// Lower modern syntax to an older ECMAScript target (`es2015`, `chrome 58`, ...).
#[derive(Debug, Clone)]
pub struct Transpile {
    target: String,
}

impl Transpile {
    /// Create for a target, rejecting targets oxc does not understand.
    pub fn new(target: impl Into<String>) -> Result<Self, String> {
        let target = target.into();
        TransformOptions::from_target(&target)?;
        Ok(Self { target })
    }

    fn transpile(&self, source: &str, path: &Path) -> Result<String, String> {
        let options = TransformOptions::from_target(&self.target)?;
        let allocator = Allocator::default();
        let source_type = script_source_type(path.extension().and_then(|e| e.to_str()));

        let ret = Parser::new(&allocator, source, source_type).parse();
        if let Some(error) = ret.errors.first() {
            return Err(error.to_string());
        }
        let mut program = ret.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
        if let Some(error) = ret.errors.first() {
            return Err(error.to_string());
        }

        Ok(Codegen::new().build(&program).code)
    }
}

impl Transform for Transpile {
    fn name(&self) -> &'static str {
        "transpile"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let code = self
            .transpile(require_text(&file, self.name())?, Path::new(&file.output))
            .map_err(|e| StageError::transform(self.name(), &file.source, e))?;
        file.set_text(code);
        Ok(file)
    }
}

// ============================================================================
// Minify
// ============================================================================

/// Mangle and compress a script.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyJs;

impl Transform for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let source_type = script_source_type(file.extension());
        let code = minify_js(require_text(&file, self.name())?, source_type)
            .map_err(|e| StageError::transform(self.name(), &file.source, e))?;
        file.set_text(code);
        Ok(file)
    }
}
