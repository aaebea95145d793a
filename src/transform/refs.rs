//! Manifest-driven reference rewriting as a transform step.

use crate::asset::{AssetClass, AssetFile};
use crate::debug;
use crate::error::StageError;
use crate::rewrite::RefTable;
use crate::stage::StageContext;

use super::{Transform, require_text};

/// Rewrite references using the manifests of `sources`.
///
/// Manifests that were not flushed in this run contribute nothing.
#[derive(Debug)]
pub struct RewriteRefs {
    sources: Vec<AssetClass>,
    table: Option<RefTable>,
}

impl RewriteRefs {
    pub fn new(sources: impl Into<Vec<AssetClass>>) -> Self {
        Self {
            sources: sources.into(),
            table: None,
        }
    }
}

impl Transform for RewriteRefs {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    fn prepare(&mut self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let manifests = self
            .sources
            .iter()
            .filter_map(|class| ctx.manifests.flushed(*class));
        self.table = Some(RefTable::build(manifests)?);
        Ok(())
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let Some(table) = self.table.as_ref().filter(|t| !t.is_empty()) else {
            return Ok(file);
        };
        let rewritten = table.rewrite(require_text(&file, self.name())?);
        if rewritten.replaced > 0 {
            debug!("rewrite"; "{}: {} reference(s)", file.rel, rewritten.replaced);
            file.set_text(rewritten.text);
        }
        Ok(file)
    }
}
