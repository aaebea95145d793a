//! Asset class definitions.

use std::fmt;

/// Class of asset, one per configured source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetClass {
    Html,
    /// Generic files copied as-is.
    Assets,
    Css,
    Stylus,
    Js,
    Img,
}

impl AssetClass {
    pub const ALL: [Self; 6] = [
        Self::Html,
        Self::Assets,
        Self::Css,
        Self::Stylus,
        Self::Js,
        Self::Img,
    ];

    /// Section key in `revline.toml`.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Assets => "assets",
            Self::Css => "css",
            Self::Stylus => "stylus",
            Self::Js => "js",
            Self::Img => "img",
        }
    }

    /// Manifest name for classes whose outputs are hash-renamed.
    ///
    /// Flushed as `<name>.manifest.json`.
    pub const fn manifest_name(self) -> Option<&'static str> {
        match self {
            Self::Img => Some("images"),
            Self::Css => Some("css"),
            Self::Stylus => Some("stylus"),
            Self::Js => Some("js"),
            Self::Html | Self::Assets => None,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_names() {
        let names: Vec<_> = AssetClass::ALL
            .iter()
            .filter_map(|c| c.manifest_name())
            .collect();
        assert_eq!(names, ["css", "stylus", "js", "images"]);
        assert_eq!(AssetClass::Html.manifest_name(), None);
    }
}
