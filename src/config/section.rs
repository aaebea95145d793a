//! Configuration sections of `revline.toml`.
//!
//! | Section             | Purpose                                    |
//! |---------------------|--------------------------------------------|
//! | `[html]` ... `[img]`| Source globs and output dir of a class     |
//! | `[tools.prefix]`    | Browser targets for vendor prefixes        |
//! | `[tools.hash]`      | Length of the content hash in file names   |
//! | `[tools.image]`     | Image compression level and JPEG quality   |
//! | `[tools.stylus]`    | External Stylus compiler command           |
//! | `[tools.lint]`      | Script linting                             |
//! | `[tools.transpile]` | ECMAScript target                          |
//! | `[tools.html]`      | Inline style/script minification           |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::asset::AssetClass;

// ============================================================================
// Class sections
// ============================================================================

/// `src` and `dist` of one asset class. Unset fields fall back to the
/// class defaults.
///
/// ```toml
/// [css]
/// src = ["src/css/**/*.css", "!src/css/vendor/**"]
/// dist = "dist/css"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassSection {
    pub src: Option<Vec<String>>,
    pub dist: Option<PathBuf>,
}

/// Resolved sources of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub src: Vec<String>,
    /// Relative to the project root.
    pub dist: PathBuf,
}

impl ClassSection {
    /// Fill unset fields; default `dist` directories live under `output`.
    pub fn resolve(&self, class: AssetClass, output: &Path) -> Sources {
        let (src, subdir) = class_defaults(class);
        Sources {
            src: self
                .src
                .clone()
                .unwrap_or_else(|| src.iter().map(ToString::to_string).collect()),
            dist: self.dist.clone().unwrap_or_else(|| match subdir {
                "" => output.to_path_buf(),
                subdir => output.join(subdir),
            }),
        }
    }
}

/// Default source globs and output subdirectory of a class.
fn class_defaults(class: AssetClass) -> (&'static [&'static str], &'static str) {
    let src: &'static [&'static str] = match class {
        AssetClass::Html => &["src/**/*.html"],
        AssetClass::Assets => &["src/assets/**/*"],
        AssetClass::Css => &["src/css/**/*.css"],
        AssetClass::Stylus => &["src/stylus/**/*.styl"],
        AssetClass::Js => &["src/js/**/*.js"],
        AssetClass::Img => &["src/images/**/*.{png,jpg,jpeg,gif,svg,webp,ico}"],
    };
    let subdir = match class {
        AssetClass::Html => "",
        AssetClass::Assets => "assets",
        AssetClass::Css | AssetClass::Stylus => "css",
        AssetClass::Js => "js",
        AssetClass::Img => "images",
    };
    (src, subdir)
}

// ============================================================================
// Tools
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub prefix: PrefixConfig,
    pub hash: HashConfig,
    pub image: ImageConfig,
    pub stylus: StylusConfig,
    pub lint: LintConfig,
    pub transpile: TranspileConfig,
    pub html: HtmlConfig,
}

/// Browserslist queries for vendor prefixing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixConfig {
    pub browsers: Vec<String>,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["last 2 versions".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    /// Hex characters of the content digest kept in file names.
    pub length: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self { length: 8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 0 copies images unchanged; 1 (fast) to 3 (best) for PNG.
    pub level: u8,
    /// Unset keeps JPEG bytes as they are; set, JPEG is re-encoded lossy.
    pub jpeg_quality: Option<u8>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            level: 3,
            jpeg_quality: None,
        }
    }
}

/// Stylus compiler, reading stdin and writing CSS to stdout.
///
/// `$FILE` and `$DIR` expand to the source file and its directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylusConfig {
    pub command: Vec<String>,
}

impl Default for StylusConfig {
    fn default() -> Self {
        Self {
            command: vec!["stylus".into(), "--print".into(), "--include".into(), "$DIR".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    pub enable: bool,
    /// Extra linter run per file with the path appended (e.g. `["npx", "eslint"]`).
    pub command: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enable: true,
            command: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileConfig {
    /// `es2015`, `es2020`, `chrome 58`, ...
    pub target: String,
}

impl Default for TranspileConfig {
    fn default() -> Self {
        Self {
            target: "es2015".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub minify_css: bool,
    pub minify_js: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            minify_css: true,
            minify_js: true,
        }
    }
}
