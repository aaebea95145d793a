//! Ordered production run: clean, then every stage in sequence.
//!
//! ```text
//! Clean → Images → Css → StylusCss → Js → Assets → Html → Done
//!   └──────────────── any error ───────────────────────→ Failed
//! ```
//!
//! After a manifest-producing stage its manifest is recorded and flushed
//! before the next stage starts, so later rewrites always see it. A failure
//! stops the run; output written by earlier stages stays on disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::AssetClass;
use crate::config::{ConfigError, PipelineConfig};
use crate::error::{PipelineError, StageError};
use crate::log;
use crate::manifest::ManifestStore;
use crate::stage::{StageContext, StageDescriptor};
use crate::transform::{
    Autoprefix, HtmlOptions, ImageCompress, Lint, MinifyCss, MinifyHtml, MinifyJs, Rev,
    RewriteRefs, StylusCompile, TransformChain, Transpile,
};
use crate::utils::path::normalize_path;

/// Named steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Clean,
    Images,
    Css,
    StylusCss,
    Js,
    Assets,
    Html,
}

impl StageName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Images => "images",
            Self::Css => "css",
            Self::StylusCss => "stylus",
            Self::Js => "js",
            Self::Assets => "assets",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pipeline is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running(StageName),
    Done,
    Failed(StageName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: StageName,
    pub written: usize,
    /// Flushed manifest, for manifest-producing classes.
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn stage(&self, name: StageName) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn total_written(&self) -> usize {
        self.stages.iter().map(|s| s.written).sum()
    }
}

#[derive(Debug)]
pub struct Pipeline {
    root: PathBuf,
    output: PathBuf,
    stages: Vec<StageDescriptor>,
    manifests: ManifestStore,
    phase: Phase,
}

impl Pipeline {
    /// Build the production stage list from configuration.
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let tools = &config.tools;
        let autoprefix = Autoprefix::new(&tools.prefix.browsers)
            .map_err(|e| ConfigError::Validation(format!("tools.prefix.browsers: {e}")))?;
        let transpile = Transpile::new(&tools.transpile.target)
            .map_err(|e| ConfigError::Validation(format!("tools.transpile.target: {e}")))?;
        let rev = Rev::new(tools.hash.length);

        let images = TransformChain::new()
            .then(ImageCompress::new(tools.image.level, tools.image.jpeg_quality))
            .then(rev);
        let css = TransformChain::new()
            .then(RewriteRefs::new([AssetClass::Img]))
            .then(autoprefix)
            .then(MinifyCss)
            .then(rev);
        let stylus = TransformChain::new()
            .then(RewriteRefs::new([AssetClass::Img]))
            .then(StylusCompile::new(tools.stylus.command.clone()))
            .then(autoprefix)
            .then(MinifyCss)
            .then(rev);
        let mut js = TransformChain::new();
        if tools.lint.enable {
            js = js.then(Lint::new(tools.lint.command.clone()));
        }
        let js = js.then(transpile).then(MinifyJs).then(rev);
        let html = TransformChain::new()
            .then(RewriteRefs::new([
                AssetClass::Img,
                AssetClass::Css,
                AssetClass::Stylus,
                AssetClass::Js,
            ]))
            .then(MinifyHtml::new(HtmlOptions {
                minify_css: tools.html.minify_css,
                minify_js: tools.html.minify_js,
            }));

        let stage = |name, class, chain| {
            let sources = config.sources(class);
            StageDescriptor::new(name, class, sources.src, chain, sources.dist)
        };
        let stages = vec![
            stage(StageName::Images, AssetClass::Img, images),
            stage(StageName::Css, AssetClass::Css, css),
            stage(StageName::StylusCss, AssetClass::Stylus, stylus),
            stage(StageName::Js, AssetClass::Js, js),
            stage(StageName::Assets, AssetClass::Assets, TransformChain::new()),
            stage(StageName::Html, AssetClass::Html, html),
        ];

        Ok(Self::from_stages(&config.root, &config.output, stages))
    }

    /// A pipeline over an explicit stage list. `output` is relative to `root`.
    pub fn from_stages(
        root: impl Into<PathBuf>,
        output: impl AsRef<Path>,
        stages: Vec<StageDescriptor>,
    ) -> Self {
        let root = root.into();
        Self {
            output: root.join(output),
            root,
            stages,
            manifests: ManifestStore::new(),
            phase: Phase::Idle,
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stage_names(&self) -> Vec<StageName> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Clean the output root and run every stage in order.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        let Self {
            root,
            output,
            stages,
            manifests,
            phase,
        } = self;
        *manifests = ManifestStore::new();

        *phase = Phase::Running(StageName::Clean);
        clean_output(root, output).map_err(|source| {
            *phase = Phase::Failed(StageName::Clean);
            PipelineError {
                stage: StageName::Clean,
                source,
            }
        })?;

        let mut report = RunReport::default();
        for stage in stages.iter_mut() {
            *phase = Phase::Running(stage.name);
            match run_stage(stage, root, manifests) {
                Ok(stage_report) => report.stages.push(stage_report),
                Err(source) => {
                    *phase = Phase::Failed(stage.name);
                    return Err(PipelineError {
                        stage: stage.name,
                        source,
                    });
                }
            }
        }

        *phase = Phase::Done;
        Ok(report)
    }
}

/// Run one stage, then record and flush its manifest.
fn run_stage(
    stage: &mut StageDescriptor,
    root: &Path,
    manifests: &mut ManifestStore,
) -> Result<StageReport, StageError> {
    let output = stage.run(&StageContext::new(root, manifests))?;

    let manifest = if stage.class.manifest_name().is_some() {
        for (original, hashed) in output.manifest_entries() {
            manifests.record(stage.class, original, hashed)?;
        }
        Some(manifests.flush(stage.class, &root.join(&stage.dist))?)
    } else {
        None
    };

    Ok(StageReport {
        name: stage.name,
        written: output.files.len(),
        manifest,
    })
}

/// Remove and recreate the output root.
fn clean_output(root: &Path, output: &Path) -> Result<(), StageError> {
    let root = normalize_path(root);
    let output = normalize_path(output);
    if root.starts_with(&output) {
        return Err(StageError::UnsafeClean { path: output });
    }

    if output.exists() {
        fs::remove_dir_all(&output).map_err(|e| StageError::io(&output, e))?;
    }
    fs::create_dir_all(&output).map_err(|e| StageError::io(&output, e))?;
    log!("clean"; "{}", output.strip_prefix(&root).unwrap_or(&output).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn png() -> Vec<u8> {
        use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "src/css/styles.css",
            "body {\n  user-select: none;\n  background: url(../images/logo.png);\n}\n",
        );
        write(root, "src/images/logo.png", png());
        write(root, "src/js/app.js", "var greeting = 'hi';\nconsole.log(greeting);\n");
        write(root, "src/assets/robots.txt", "User-agent: *\n");
        write(
            root,
            "src/index.html",
            "<html>\n  <head>\n    <link href=\"css/styles.css\" rel=\"stylesheet\">\n  </head>\n  <body>\n    <script src=\"js/app.js\"></script>\n  </body>\n</html>\n",
        );
        dir
    }

    fn pipeline(root: &Path) -> Pipeline {
        let config = PipelineConfig::default().with_root(root);
        Pipeline::new(&config).unwrap()
    }

    fn manifest(path: &Path) -> BTreeMap<String, String> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_production_run() {
        let dir = site();
        let root = dir.path();
        let mut pipeline = pipeline(root);
        let report = pipeline.run().unwrap();
        assert_eq!(pipeline.phase(), Phase::Done);

        let css = manifest(&root.join("dist/css/css.manifest.json"));
        let hashed = &css["styles.css"];
        let hash = hashed
            .strip_prefix("styles-")
            .and_then(|s| s.strip_suffix(".css"))
            .unwrap();
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(root.join("dist/css").join(hashed).is_file());

        let html = fs::read_to_string(root.join("dist/index.html")).unwrap();
        assert!(html.contains(&format!("href=\"css/{hashed}\"")));
        let js = manifest(&root.join("dist/js/js.manifest.json"));
        assert!(html.contains(&format!("src=\"js/{}\"", js["app.js"])));
        assert!(!html.contains('\n'));

        let images = manifest(&root.join("dist/images/images.manifest.json"));
        let logo = &images["logo.png"];
        assert!(root.join("dist/images").join(logo).is_file());
        let styles = fs::read_to_string(root.join("dist/css").join(hashed)).unwrap();
        assert!(styles.contains(&format!("../images/{logo}")));
        assert!(!styles.contains("logo.png"));

        assert!(root.join("dist/assets/robots.txt").is_file());
        assert_eq!(report.stage(StageName::Assets).unwrap().written, 1);
        assert_eq!(report.stage(StageName::StylusCss).unwrap().written, 0);
        assert!(root.join("dist/css/stylus.manifest.json").is_file());
    }

    #[test]
    fn test_runs_are_reproducible() {
        let dir = site();
        let root = dir.path();
        let mut pipeline = pipeline(root);

        pipeline.run().unwrap();
        let first_css = fs::read(root.join("dist/css/css.manifest.json")).unwrap();
        let first_js = fs::read(root.join("dist/js/js.manifest.json")).unwrap();
        let first_html = fs::read(root.join("dist/index.html")).unwrap();

        pipeline.run().unwrap();
        assert_eq!(fs::read(root.join("dist/css/css.manifest.json")).unwrap(), first_css);
        assert_eq!(fs::read(root.join("dist/js/js.manifest.json")).unwrap(), first_js);
        assert_eq!(fs::read(root.join("dist/index.html")).unwrap(), first_html);
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let dir = site();
        let root = dir.path();
        write(root, "dist/old-1234abcd.css", "stale");
        write(root, "dist/js/gone.js", "stale");

        pipeline(root).run().unwrap();
        assert!(!root.join("dist/old-1234abcd.css").exists());
        assert!(!root.join("dist/js/gone.js").exists());
    }

    #[test]
    fn test_clean_refuses_project_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "keep.txt", "x");
        let mut pipeline = Pipeline::from_stages(dir.path(), ".", vec![]);
        let err = pipeline.run().unwrap_err();
        assert_eq!(err.stage, StageName::Clean);
        assert!(matches!(err.source, StageError::UnsafeClean { .. }));
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_lint_failure_stops_run() {
        let dir = site();
        let root = dir.path();
        write(root, "src/js/broken.js", "function broken( {\n");

        let mut pipeline = pipeline(root);
        let err = pipeline.run().unwrap_err();
        assert_eq!(err.stage, StageName::Js);
        assert!(matches!(err.source, StageError::LintViolation { .. }));
        assert_eq!(pipeline.phase(), Phase::Failed(StageName::Js));

        // Nothing from the failing stage, earlier output kept, later stages skipped
        assert!(!root.join("dist/js").exists());
        assert!(root.join("dist/css/css.manifest.json").is_file());
        assert!(root.join("dist/images/images.manifest.json").is_file());
        assert!(!root.join("dist/assets").exists());
        assert!(!root.join("dist/index.html").exists());
    }

    #[test]
    fn test_conflicting_manifests_fail_html() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/css/main.css", "a{}");
        write(root, "src/other/main.css", "b{}");
        write(root, "src/index.html", "<link href=\"main.css\">");

        let stages = vec![
            StageDescriptor::new(
                StageName::Css,
                AssetClass::Css,
                vec!["src/css/*.css".into()],
                TransformChain::new().then(Rev::new(8)),
                "dist/css",
            ),
            StageDescriptor::new(
                StageName::StylusCss,
                AssetClass::Stylus,
                vec!["src/other/*.css".into()],
                TransformChain::new().then(Rev::new(8)),
                "dist/css",
            ),
            StageDescriptor::new(
                StageName::Html,
                AssetClass::Html,
                vec!["src/*.html".into()],
                TransformChain::new().then(RewriteRefs::new([AssetClass::Css, AssetClass::Stylus])),
                "dist",
            ),
        ];
        let mut pipeline = Pipeline::from_stages(root, "dist", stages);
        let err = pipeline.run().unwrap_err();
        assert_eq!(err.stage, StageName::Html);
        assert!(matches!(err.source, StageError::ManifestConflict { ref key, .. } if key == "main.css"));
    }

    #[test]
    fn test_stage_order() {
        let dir = TempDir::new().unwrap();
        let names = pipeline(dir.path()).stage_names();
        assert_eq!(
            names,
            [
                StageName::Images,
                StageName::Css,
                StageName::StylusCss,
                StageName::Js,
                StageName::Assets,
                StageName::Html,
            ]
        );
    }
}
