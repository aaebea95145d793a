//! Manifest store: original asset path → hash-renamed output path.
//!
//! One manifest per hash-renaming class. A stage records entries, the
//! orchestrator flushes the manifest to `<dist>/<name>.manifest.json` and from
//! then on it is sealed and visible read-only to later stages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::asset::AssetClass;
use crate::error::StageError;

/// Mapping of original path to hashed path, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    name: &'static str,
    entries: BTreeMap<String, String>,
    sealed: bool,
}

impl Manifest {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File name the manifest is flushed under.
    pub fn file_name(&self) -> String {
        format!("{}.manifest.json", self.name)
    }

    /// Pretty JSON with sorted keys and a trailing newline.
    pub fn to_json(&self) -> String {
        // BTreeMap<String, String> serialization cannot fail
        let mut json = serde_json::to_string_pretty(&self.entries).unwrap_or_default();
        json.push('\n');
        json
    }
}

/// Per-class manifest storage owned by the orchestrator.
#[derive(Debug, Default)]
pub struct ManifestStore {
    manifests: FxHashMap<AssetClass, Manifest>,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one entry. Classes without a manifest are ignored.
    pub fn record(
        &mut self,
        class: AssetClass,
        original: impl Into<String>,
        hashed: impl Into<String>,
    ) -> Result<(), StageError> {
        let Some(name) = class.manifest_name() else {
            return Ok(());
        };
        let manifest = self
            .manifests
            .entry(class)
            .or_insert_with(|| Manifest::new(name));
        if manifest.sealed {
            return Err(StageError::ManifestSealed { manifest: name });
        }

        let (original, hashed) = (original.into(), hashed.into());
        match manifest.entries.get(&original) {
            Some(existing) if *existing != hashed => Err(StageError::ManifestConflict {
                key: original,
                first: existing.clone(),
                second: hashed,
            }),
            Some(_) => Ok(()),
            None => {
                manifest.entries.insert(original, hashed);
                Ok(())
            }
        }
    }

    /// Write the class manifest into `dist` and seal it.
    ///
    /// A class with no entries still produces an empty manifest.
    pub fn flush(&mut self, class: AssetClass, dist: &Path) -> Result<PathBuf, StageError> {
        let name = class
            .manifest_name()
            .ok_or(StageError::NoManifest { class })?;
        let manifest = self
            .manifests
            .entry(class)
            .or_insert_with(|| Manifest::new(name));
        if manifest.sealed {
            return Err(StageError::ManifestSealed { manifest: name });
        }

        fs::create_dir_all(dist).map_err(|e| StageError::io(dist, e))?;
        let path = dist.join(manifest.file_name());
        fs::write(&path, manifest.to_json()).map_err(|e| StageError::io(&path, e))?;

        manifest.sealed = true;
        Ok(path)
    }

    /// A flushed manifest, if the class has produced one.
    pub fn flushed(&self, class: AssetClass) -> Option<&Manifest> {
        self.manifests.get(&class).filter(|m| m.sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_and_flush() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::new();
        store
            .record(AssetClass::Css, "styles.css", "styles-3f2a9c1d.css")
            .unwrap();
        store
            .record(AssetClass::Css, "base.css", "base-00000000.css")
            .unwrap();

        assert!(store.flushed(AssetClass::Css).is_none());
        let path = store.flush(AssetClass::Css, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("css.manifest.json"));

        let json: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["styles.css"], "styles-3f2a9c1d.css");
        assert_eq!(json.len(), 2);

        let manifest = store.flushed(AssetClass::Css).unwrap();
        assert_eq!(manifest.get("base.css"), Some("base-00000000.css"));
    }

    #[test]
    fn test_keys_are_sorted_in_output() {
        let mut store = ManifestStore::new();
        store.record(AssetClass::Js, "z.js", "z-1.js").unwrap();
        store.record(AssetClass::Js, "a.js", "a-1.js").unwrap();
        let dir = TempDir::new().unwrap();
        let path = store.flush(AssetClass::Js, dir.path()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.find("a.js").unwrap() < text.find("z.js").unwrap());
    }

    #[test]
    fn test_sealed_after_flush() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::new();
        store.flush(AssetClass::Img, dir.path()).unwrap();
        let err = store
            .record(AssetClass::Img, "logo.png", "logo-1.png")
            .unwrap_err();
        assert!(matches!(err, StageError::ManifestSealed { manifest: "images" }));
        assert!(store.flush(AssetClass::Img, dir.path()).is_err());
    }

    #[test]
    fn test_empty_manifest_is_written() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::new();
        let path = store.flush(AssetClass::Stylus, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{}\n");
        assert!(store.flushed(AssetClass::Stylus).unwrap().is_empty());
    }

    #[test]
    fn test_conflicting_record() {
        let mut store = ManifestStore::new();
        store.record(AssetClass::Css, "a.css", "a-1.css").unwrap();
        store.record(AssetClass::Css, "a.css", "a-1.css").unwrap();
        let err = store.record(AssetClass::Css, "a.css", "a-2.css").unwrap_err();
        assert!(matches!(err, StageError::ManifestConflict { .. }));
    }

    #[test]
    fn test_html_has_no_manifest() {
        let mut store = ManifestStore::new();
        store.record(AssetClass::Html, "index.html", "x").unwrap();
        assert!(store.flushed(AssetClass::Html).is_none());
    }
}
