//! Stylesheet transforms backed by lightningcss.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::asset::AssetFile;
use crate::error::StageError;

use super::minify::minify_css;
use super::{Transform, require_text};

/// Add vendor prefixes for the configured browser targets.
///
/// Output stays readable; `MinifyCss` compacts it afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Autoprefix {
    targets: Targets,
}

impl Autoprefix {
    /// Resolve browserslist queries (`last 2 versions`, `> 1%`, ...).
    pub fn new(queries: &[String]) -> Result<Self, String> {
        let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
            .map_err(|e| e.to_string())?;
        Ok(Self {
            targets: Targets {
                browsers,
                ..Targets::default()
            },
        })
    }

    fn prefix(&self, source: &str, filename: &str) -> Result<String, String> {
        let mut stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| e.to_string())?;

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: false,
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| e.to_string())?;
        Ok(result.code)
    }
}

impl Transform for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let css = self
            .prefix(require_text(&file, self.name())?, &file.rel)
            .map_err(|e| StageError::transform(self.name(), &file.source, e))?;
        file.set_text(css);
        Ok(file)
    }
}

/// Compact a stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyCss;

impl Transform for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let css = minify_css(require_text(&file, self.name())?)
            .map_err(|e| StageError::transform(self.name(), &file.source, e))?;
        file.set_text(css);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetClass;
    use crate::transform::testing::file;

    fn old_browsers() -> Autoprefix {
        Autoprefix::new(&["safari 8".to_string()]).unwrap()
    }

    #[test]
    fn test_autoprefix_adds_vendor_prefix() {
        let out = old_browsers()
            .apply(file(AssetClass::Css, "a.css", ".box { user-select: none; }"))
            .unwrap();
        assert!(out.text().unwrap().contains("-webkit-user-select"));
    }

    #[test]
    fn test_autoprefix_invalid_query() {
        assert!(Autoprefix::new(&["not a real browser query".to_string()]).is_err());
    }

    #[test]
    fn test_prefix_then_minify() {
        let f = file(AssetClass::Css, "a.css", "body {\n  color: red;\n}\n");
        let f = old_browsers().apply(f).unwrap();
        let f = MinifyCss.apply(f).unwrap();
        assert_eq!(f.text().unwrap(), "body{color:red}");
    }

    #[test]
    fn test_minify_css_keeps_name() {
        let out = MinifyCss
            .apply(file(AssetClass::Css, "theme/dark.css", "a { color: blue }"))
            .unwrap();
        assert_eq!(out.output, "theme/dark.css");
    }
}
