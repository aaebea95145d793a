//! Pipeline configuration from `revline.toml`.
//!
//! ```text
//! config/
//! ├── error.rs     # ConfigError, ConfigDiagnostics
//! ├── section.rs   # [html] ... [img], [tools.*]
//! └── mod.rs       # PipelineConfig (this file)
//! ```
//!
//! The file is searched upward from the cwd; its directory is the project
//! root. Without a file, built-in defaults apply with the cwd as root.

mod error;
mod section;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{ClassSection, Sources, ToolsConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::asset::{AssetClass, compile_glob};
use crate::cli::Cli;
use crate::log;
use crate::transform::{Autoprefix, Transpile};
use crate::utils::path::normalize_path;

/// Root configuration structure representing `revline.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute path to the config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory
    #[serde(skip)]
    pub root: PathBuf,

    /// Output root, removed and recreated by every run (relative to root)
    pub output: PathBuf,

    pub html: ClassSection,
    pub assets: ClassSection,
    pub css: ClassSection,
    pub stylus: ClassSection,
    pub js: ClassSection,
    pub img: ClassSection,

    pub tools: ToolsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            output: PathBuf::from("dist"),
            html: ClassSection::default(),
            assets: ClassSection::default(),
            css: ClassSection::default(),
            stylus: ClassSection::default(),
            js: ClassSection::default(),
            img: ClassSection::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate the configuration named by the CLI.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let root = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
                let mut config = Self::from_path(&path)?.with_root(root);
                config.config_path = normalize_path(&path);
                crate::debug!("config"; "loaded {}", config.config_path.display());
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self::default().with_root(&cwd)
            }
        };

        if let Some(output) = &cli.prod_args().output {
            config.output.clone_from(output);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a file, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Set the project root (normalized to an absolute path).
    #[must_use]
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = normalize_path(root.as_ref());
        self
    }

    pub fn section(&self, class: AssetClass) -> &ClassSection {
        match class {
            AssetClass::Html => &self.html,
            AssetClass::Assets => &self.assets,
            AssetClass::Css => &self.css,
            AssetClass::Stylus => &self.stylus,
            AssetClass::Js => &self.js,
            AssetClass::Img => &self.img,
        }
    }

    /// Source globs and `dist` of a class, with defaults filled in.
    pub fn sources(&self, class: AssetClass) -> Sources {
        self.section(class).resolve(class, &self.output)
    }

    /// Absolute output root.
    pub fn output_dir(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.output))
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        let output = self.output_dir();
        if normalize_path(&self.root).starts_with(&output) {
            diag.error_with_hint(
                "output",
                format!("`{}` contains the project root and cannot be cleaned", self.output.display()),
                "point `output` at a dedicated directory such as \"dist\"",
            );
        }

        for class in AssetClass::ALL {
            self.validate_sources(class, &output, &mut diag);
        }
        self.validate_tools(&mut diag);

        diag.into_result()
    }

    fn validate_sources(&self, class: AssetClass, output: &Path, diag: &mut ConfigDiagnostics) {
        let key = class.key();
        let sources = self.sources(class);

        if !sources.src.iter().any(|p| !p.starts_with('!')) {
            diag.error(format!("{key}.src"), "needs at least one pattern that is not an exclusion");
        }
        for pattern in &sources.src {
            if let Err(err) = compile_glob(pattern.trim_start_matches('!')) {
                let detail = std::error::Error::source(&err)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                diag.error(format!("{key}.src"), format!("{err}: {detail}"));
            }
        }

        let dist = normalize_path(&self.root.join(&sources.dist));
        if !dist.starts_with(output) {
            diag.error_with_hint(
                format!("{key}.dist"),
                format!("`{}` is outside the output root", sources.dist.display()),
                format!("use a directory under `{}`", self.output.display()),
            );
        }
    }

    fn validate_tools(&self, diag: &mut ConfigDiagnostics) {
        let tools = &self.tools;

        if !(4..=64).contains(&tools.hash.length) {
            diag.error("tools.hash.length", format!("{} is not in 4..=64", tools.hash.length));
        }
        if let Some(quality) = tools.image.jpeg_quality
            && !(1..=100).contains(&quality)
        {
            diag.error(
                "tools.image.jpeg_quality",
                format!("{quality} is not in 1..=100"),
            );
        }
        if tools.stylus.command.is_empty() {
            diag.error_with_hint(
                "tools.stylus.command",
                "must not be empty",
                "e.g. [\"npx\", \"stylus\", \"--print\"]",
            );
        }
        if let Err(err) = Autoprefix::new(&tools.prefix.browsers) {
            diag.error("tools.prefix.browsers", err);
        }
        if let Err(err) = Transpile::new(&tools.transpile.target) {
            diag.error("tools.transpile.target", err);
        }
    }
}

/// Find `config_name` in `start` or the nearest ancestor that has it.
///
/// ```text
/// /home/user/site/src/css/    ← cwd
/// /home/user/site/revline.toml ← found
/// ```
fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }
    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> PipelineConfig {
        PipelineConfig::from_str(content).unwrap()
    }

    fn diagnostics(config: &PipelineConfig) -> Vec<String> {
        match config.validate() {
            Err(ConfigError::Diagnostics(diag)) => {
                diag.errors().iter().map(|d| d.field.clone()).collect()
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => vec![],
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.output, PathBuf::from("dist"));
        assert_eq!(config.tools.hash.length, 8);
        assert_eq!(config.tools.prefix.browsers, ["last 2 versions"]);
        assert_eq!(config.tools.transpile.target, "es2015");
        assert!(config.tools.lint.enable);
        assert_eq!(config.tools.image.jpeg_quality, None);
        assert_eq!(
            config.sources(AssetClass::Img).dist,
            PathBuf::from("dist/images")
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::default().with_root(dir.path());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            output = "public"

            [css]
            src = ["web/css/**/*.css", "!web/css/vendor/**"]
            dist = "public/static/css"

            [tools.hash]
            length = 12

            [tools.image]
            level = 1
            jpeg_quality = 70

            [tools.lint]
            enable = false
            command = ["npx", "eslint"]
            "#,
        );
        let css = config.sources(AssetClass::Css);
        assert_eq!(css.src.len(), 2);
        assert_eq!(css.dist, PathBuf::from("public/static/css"));
        assert_eq!(config.sources(AssetClass::Js).dist, PathBuf::from("public/js"));
        assert_eq!(config.tools.hash.length, 12);
        assert_eq!(config.tools.image.level, 1);
        assert_eq!(config.tools.image.jpeg_quality, Some(70));
        assert!(!config.tools.lint.enable);
        assert_eq!(config.tools.lint.command, ["npx", "eslint"]);
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) = PipelineConfig::parse_with_ignored(
            "outptu = \"x\"\n[tools.hash]\nlenght = 4\n",
        )
        .unwrap();
        assert_eq!(ignored, ["outptu", "tools.hash.lenght"]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            PipelineConfig::from_str("output = "),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let dir = TempDir::new().unwrap();
        let config = parse(
            r#"
            [js]
            src = ["!src/js/vendor/**"]

            [css]
            dist = "build/css"

            [img]
            src = ["src/images/[a-"]

            [tools.hash]
            length = 2

            [tools.image]
            jpeg_quality = 0

            [tools.stylus]
            command = []
            "#,
        )
        .with_root(dir.path());

        let fields = diagnostics(&config);
        for field in [
            "js.src",
            "css.dist",
            "img.src",
            "tools.hash.length",
            "tools.image.jpeg_quality",
            "tools.stylus.command",
        ] {
            assert!(fields.iter().any(|f| f == field), "missing {field} in {fields:?}");
        }
    }

    #[test]
    fn test_output_containing_root_rejected() {
        let dir = TempDir::new().unwrap();
        let config = parse("output = \".\"\n[html]\ndist = \".\"").with_root(dir.path().join("site"));
        assert!(diagnostics(&config).iter().any(|f| f == "output"));
    }

    #[test]
    fn test_invalid_tool_settings() {
        let dir = TempDir::new().unwrap();
        let config = parse(
            "[tools.prefix]\nbrowsers = [\"not a browser query\"]\n[tools.transpile]\ntarget = \"es1999\"",
        )
        .with_root(dir.path());
        let fields = diagnostics(&config);
        assert!(fields.iter().any(|f| f == "tools.prefix.browsers"));
        assert!(fields.iter().any(|f| f == "tools.transpile.target"));
    }

    #[test]
    fn test_find_config_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/css");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("revline.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("revline.toml")).unwrap();
        assert_eq!(found, dir.path().join("revline.toml"));
        assert!(find_config_file(&nested, Path::new("missing.toml")).is_none());
    }
}
