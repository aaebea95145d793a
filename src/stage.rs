//! One pipeline stage: scan → transform (parallel) → write.
//!
//! A stage is all-or-nothing on disk: every matched file is transformed
//! first and output is written only when all of them passed. A lint failure
//! therefore leaves the stage's `dist` untouched.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::asset::{AssetClass, AssetFile, SourceMatch, scan_sources};
use crate::error::StageError;
use crate::logger::ProgressLine;
use crate::manifest::ManifestStore;
use crate::pipeline::StageName;
use crate::transform::TransformChain;
use crate::utils::plural_count;
use crate::{debug, log};

/// Read-only view handed to transforms while a stage runs.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Project root; source patterns and `dist` are relative to it.
    pub root: &'a Path,
    /// Manifests flushed by earlier stages of this run.
    pub manifests: &'a ManifestStore,
}

impl<'a> StageContext<'a> {
    pub const fn new(root: &'a Path, manifests: &'a ManifestStore) -> Self {
        Self { root, manifests }
    }
}

/// Inputs, transform chain and output directory of one stage.
#[derive(Debug)]
pub struct StageDescriptor {
    pub name: StageName,
    pub class: AssetClass,
    /// Glob patterns relative to the project root.
    pub inputs: Vec<String>,
    pub chain: TransformChain,
    /// Output directory relative to the project root.
    pub dist: PathBuf,
}

/// A file written by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Original relative path.
    pub rel: String,
    /// Output path relative to `dist`.
    pub output: String,
    /// Name before hash-renaming, when the chain renamed the file.
    pub rev_origin: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct StageOutput {
    pub files: Vec<WrittenFile>,
}

impl StageOutput {
    /// `(original, hashed)` pairs for the class manifest.
    pub fn manifest_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .filter_map(|f| Some((f.rev_origin.as_deref()?, f.output.as_str())))
    }
}

impl StageDescriptor {
    pub fn new(
        name: StageName,
        class: AssetClass,
        inputs: Vec<String>,
        chain: TransformChain,
        dist: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name,
            class,
            inputs,
            chain,
            dist: dist.into(),
        }
    }

    /// Run the stage against `ctx`.
    pub fn run(&mut self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let matches = scan_sources(ctx.root, &self.inputs)?;
        if matches.is_empty() {
            debug!(self.name.as_str(); "no files matched {:?}", self.inputs);
            return Ok(StageOutput::default());
        }
        self.chain.prepare(ctx)?;

        let dist = ctx.root.join(&self.dist);

        let files = self.transform_all(&matches)?;
        let written = write_all(&dist, files)?;

        log!(
            self.name.as_str();
            "{} -> {}",
            plural_count(written.len(), "file"),
            display_path(ctx.root, &dist)
        );
        Ok(StageOutput { files: written })
    }

    /// Transform every match in parallel; the first failure in sorted order wins.
    fn transform_all(&self, matches: &[SourceMatch]) -> Result<Vec<AssetFile>, StageError> {
        let progress = ProgressLine::new(self.name.as_str(), matches.len());
        let results: Vec<Result<AssetFile, StageError>> = matches
            .par_iter()
            .map(|m| {
                let contents = fs::read(&m.source).map_err(|e| StageError::io(&m.source, e))?;
                let file = AssetFile::new(m.source.clone(), m.rel.clone(), self.class, contents);
                let result = self.chain.apply(file);
                progress.inc();
                result
            })
            .collect();
        progress.finish();

        results.into_iter().collect()
    }
}

/// Write transformed files under `dist`.
fn write_all(dist: &Path, files: Vec<AssetFile>) -> Result<Vec<WrittenFile>, StageError> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dist.join(&file.output);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
        }
        fs::write(&path, &file.contents).map_err(|e| StageError::io(&path, e))?;
        debug!(file.class.key(); "{} -> {}", file.rel, file.output);

        written.push(WrittenFile {
            rel: file.rel,
            output: file.output,
            rev_origin: file.rev_origin,
            path,
        });
    }
    Ok(written)
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
