//! In-flight asset file.

use std::path::{Path, PathBuf};

use super::AssetClass;

/// One matched source file travelling through a stage's transform chain.
///
/// `rel` is the identity: the path relative to the base of the glob that
/// matched it. Transforms change `contents` and may rename `output`.
#[derive(Debug, Clone)]
pub struct AssetFile {
    /// Absolute source path.
    pub source: PathBuf,
    /// Original relative path, `/`-separated.
    pub rel: String,
    pub class: AssetClass,
    pub contents: Vec<u8>,
    /// Output path relative to the stage's dist directory, `/`-separated.
    pub output: String,
    /// Output name just before hash-renaming (manifest key).
    pub rev_origin: Option<String>,
}

impl AssetFile {
    pub fn new(source: PathBuf, rel: String, class: AssetClass, contents: Vec<u8>) -> Self {
        Self {
            source,
            output: rel.clone(),
            rel,
            class,
            contents,
            rev_origin: None,
        }
    }

    /// Extension of the current output name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.output).extension()?.to_str()
    }

    /// Contents as UTF-8 text, or `None` for binary data.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    /// Replace contents with transformed text.
    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
    }

    /// Change the extension of the output name (`main.styl` -> `main.css`).
    pub fn set_extension(&mut self, ext: &str) {
        let (dir, name) = split_name(&self.output);
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        self.output = format!("{dir}{stem}.{ext}");
    }
}

/// Split `a/b/c.css` into (`a/b/`, `c.css`).
pub fn split_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(rel: &str) -> AssetFile {
        AssetFile::new(PathBuf::from(rel), rel.into(), AssetClass::Stylus, vec![])
    }

    #[test]
    fn test_set_extension() {
        let mut f = file("theme/main.styl");
        f.set_extension("css");
        assert_eq!(f.output, "theme/main.css");
        assert_eq!(f.rel, "theme/main.styl");
        assert_eq!(f.extension(), Some("css"));
    }

    #[test]
    fn test_set_extension_without_ext() {
        let mut f = file("README");
        f.set_extension("txt");
        assert_eq!(f.output, "README.txt");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a/b/c.css"), ("a/b/", "c.css"));
        assert_eq!(split_name("c.css"), ("", "c.css"));
    }
}
