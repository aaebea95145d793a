//! Transform stages: the opaque "bytes in, bytes + name out" steps of a stage.
//!
//! | Transform       | Delegates to                 | Used by            |
//! |-----------------|------------------------------|--------------------|
//! | `ImageCompress` | image, usvg                  | img                |
//! | `RewriteRefs`   | [`crate::rewrite`]           | css, stylus, html  |
//! | `StylusCompile` | external `stylus` command    | stylus             |
//! | `Autoprefix`    | lightningcss (browserslist)  | css, stylus        |
//! | `MinifyCss`     | lightningcss                 | css, stylus        |
//! | `Lint`          | oxc semantic + lint command  | js                 |
//! | `Transpile`     | oxc transformer              | js                 |
//! | `MinifyJs`      | oxc minifier                 | js                 |
//! | `MinifyHtml`    | built-in + oxc/lightningcss  | html               |
//! | `Rev`           | blake3                       | img, css, stylus, js |

mod css;
mod html;
mod img;
pub mod minify;
mod refs;
mod rev;
mod script;
mod stylus;

pub use css::{Autoprefix, MinifyCss};
pub use html::{HtmlOptions, MinifyHtml, minify_html};
pub use img::ImageCompress;
pub use refs::RewriteRefs;
pub use rev::Rev;
pub use script::{Lint, MinifyJs, Transpile};
pub use stylus::StylusCompile;

use crate::asset::AssetFile;
use crate::error::StageError;
use crate::stage::StageContext;

/// One step of a stage's transform chain.
///
/// `apply` runs on rayon worker threads, one call per file.
pub trait Transform: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Called once per run before any file, with the manifests flushed so far.
    fn prepare(&mut self, _ctx: &StageContext<'_>) -> Result<(), StageError> {
        Ok(())
    }

    /// Transform one file. Returning an error rejects it and fails the stage.
    fn apply(&self, file: AssetFile) -> Result<AssetFile, StageError>;
}

/// Ordered list of transforms applied to every file of a stage.
#[derive(Default)]
pub struct TransformChain {
    steps: Vec<Box<dyn Transform>>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform (builder style).
    #[must_use]
    pub fn then(mut self, step: impl Transform + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn prepare(&mut self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        for step in &mut self.steps {
            step.prepare(ctx)?;
        }
        Ok(())
    }

    /// Run the whole chain on one file, stopping at the first rejection.
    pub fn apply(&self, file: AssetFile) -> Result<AssetFile, StageError> {
        self.steps.iter().try_fold(file, |file, step| step.apply(file))
    }
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Contents of `file` as text, or a failure naming the transform.
pub(crate) fn require_text<'a>(
    file: &'a AssetFile,
    transform: &'static str,
) -> Result<&'a str, StageError> {
    file.text()
        .ok_or_else(|| StageError::transform(transform, &file.source, "source is not valid UTF-8"))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::asset::{AssetClass, AssetFile};
    use std::path::PathBuf;

    /// In-memory file for transform tests.
    pub fn file(class: AssetClass, rel: &str, contents: &str) -> AssetFile {
        AssetFile::new(
            PathBuf::from("src").join(rel),
            rel.to_string(),
            class,
            contents.as_bytes().to_vec(),
        )
    }
}
