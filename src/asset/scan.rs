//! Glob-based source scanning (reads the filesystem, no side effects).
//!
//! A pattern's base is its leading path without glob metacharacters:
//!
//! ```text
//! src/css/**/*.css      base: src/css     src/css/theme/dark.css -> theme/dark.css
//! src/js/main.js        base: src/js      (singular, must exist)
//! !src/js/vendor/**     excludes matches of the other patterns
//! ```
//!
//! Dotfiles and dot-directories below the base are skipped unless a segment
//! of the pattern itself starts with `.` (`src/assets/.well-known/*`).

use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use crate::error::StageError;

/// A source file matched by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMatch {
    /// Absolute (root-joined) source path.
    pub source: PathBuf,
    /// Path relative to the pattern base, `/`-separated.
    pub rel: String,
}

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Whether a pattern contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// Leading directory of a pattern that contains no metacharacters.
///
/// For singular patterns this is the parent directory.
pub fn glob_base(pattern: &str) -> &str {
    let cut = match pattern.find(GLOB_META) {
        Some(i) => &pattern[..i],
        None => pattern,
    };
    match cut.rfind('/') {
        Some(i) => &pattern[..i],
        None => "",
    }
}

/// Compile a glob the way all sources are matched (`*` stays within a segment).
pub fn compile_glob(pattern: &str) -> Result<Glob, StageError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| StageError::Glob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Resolve `patterns` against `root` into a sorted, de-duplicated file list.
///
/// Patterns starting with `!` exclude. A missing base directory yields
/// nothing; a missing singular file is an error.
pub fn scan_sources(root: &Path, patterns: &[String]) -> Result<Vec<SourceMatch>, StageError> {
    let (includes, excludes): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| !p.starts_with('!'));
    let excludes = build_excludes(&excludes)?;

    let mut seen = FxHashSet::default();
    let mut results = Vec::new();

    for pattern in includes {
        let pattern = pattern.trim_start_matches("./");
        let base = glob_base(pattern);

        let found = if is_glob(pattern) {
            let matcher = compile_glob(pattern)?.compile_matcher();
            walk_matches(root, base, &matcher, matches_dotfiles(pattern))?
        } else {
            let source = root.join(pattern);
            if !source.is_file() {
                return Err(StageError::NotFound {
                    pattern: pattern.to_string(),
                });
            }
            vec![(pattern.to_string(), source)]
        };

        for (root_rel, source) in found {
            if excludes.is_match(&root_rel) || !seen.insert(source.clone()) {
                continue;
            }
            let rel = strip_base(&root_rel, base).to_string();
            results.push(SourceMatch { source, rel });
        }
    }

    results.sort_by(|a, b| a.rel.cmp(&b.rel).then_with(|| a.source.cmp(&b.source)));
    Ok(results)
}

fn build_excludes(patterns: &[&String]) -> Result<GlobSet, StageError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim_start_matches('!').trim_start_matches("./");
        builder.add(compile_glob(pattern)?);
    }
    builder.build().map_err(|source| StageError::Glob {
        pattern: patterns
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        source,
    })
}

/// Whether a pattern names hidden entries explicitly.
fn matches_dotfiles(pattern: &str) -> bool {
    pattern.split('/').any(|segment| segment.starts_with('.'))
}

/// Walk `root/base` and return (root-relative path, absolute path) of every
/// file the matcher accepts.
fn walk_matches(
    root: &Path,
    base: &str,
    matcher: &GlobMatcher,
    dotfiles: bool,
) -> Result<Vec<(String, PathBuf)>, StageError> {
    let dir = root.join(base);
    if !dir.is_dir() {
        return Ok(vec![]);
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(&dir).sort(true).skip_hidden(false) {
        let entry = entry.map_err(|e| StageError::io(&dir, std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !dotfiles && is_hidden_below(&path, &dir) {
            continue;
        }
        let Some(root_rel) = to_slash(path.strip_prefix(root).unwrap_or(&path)) else {
            continue;
        };
        if matcher.is_match(&root_rel) {
            found.push((root_rel, path));
        }
    }
    Ok(found)
}

fn is_hidden_below(path: &Path, dir: &Path) -> bool {
    path.strip_prefix(dir).unwrap_or(path).components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    })
}

fn strip_base<'a>(root_rel: &'a str, base: &str) -> &'a str {
    if base.is_empty() {
        return root_rel;
    }
    root_rel
        .strip_prefix(base)
        .map_or(root_rel, |rest| rest.trim_start_matches('/'))
}

/// `/`-separated form of a relative path (`None` for non-UTF-8 names).
fn to_slash(path: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = path.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn patterns(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    fn rels(found: &[SourceMatch]) -> Vec<&str> {
        found.iter().map(|m| m.rel.as_str()).collect()
    }

    #[test]
    fn test_glob_base() {
        assert_eq!(glob_base("src/css/**/*.css"), "src/css");
        assert_eq!(glob_base("src/*.html"), "src");
        assert_eq!(glob_base("*.html"), "");
        assert_eq!(glob_base("src/js/main.js"), "src/js");
        assert_eq!(glob_base("src/img/{a,b}.png"), "src/img");
    }

    #[test]
    fn test_scan_nested_relative_to_base() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/css/styles.css");
        touch(dir.path(), "src/css/theme/dark.css");
        touch(dir.path(), "src/css/notes.txt");

        let found = scan_sources(dir.path(), &patterns(&["src/css/**/*.css"])).unwrap();
        assert_eq!(rels(&found), ["styles.css", "theme/dark.css"]);
        assert_eq!(found[0].source, dir.path().join("src/css/styles.css"));
    }

    #[test]
    fn test_scan_star_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/index.html");
        touch(dir.path(), "src/pages/about.html");

        let found = scan_sources(dir.path(), &patterns(&["src/*.html"])).unwrap();
        assert_eq!(rels(&found), ["index.html"]);
    }

    #[test]
    fn test_scan_excludes_and_dedup() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/js/app.js");
        touch(dir.path(), "src/js/vendor/lib.js");

        let found = scan_sources(
            dir.path(),
            &patterns(&["src/js/**/*.js", "src/js/app.js", "!src/js/vendor/**"]),
        )
        .unwrap();
        assert_eq!(rels(&found), ["app.js"]);
    }

    #[test]
    fn test_scan_missing_base_is_empty() {
        let dir = TempDir::new().unwrap();
        let found = scan_sources(dir.path(), &patterns(&["src/images/**/*.png"])).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_missing_singular_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = scan_sources(dir.path(), &patterns(&["src/js/main.js"])).unwrap_err();
        assert!(matches!(err, StageError::NotFound { ref pattern } if pattern == "src/js/main.js"));
    }

    #[test]
    fn test_scan_invalid_glob() {
        let dir = TempDir::new().unwrap();
        let err = scan_sources(dir.path(), &patterns(&["src/[a.css"])).unwrap_err();
        assert!(matches!(err, StageError::Glob { .. }));
    }

    #[test]
    fn test_scan_skips_dotfiles() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/assets/fonts/a.woff2");
        touch(dir.path(), "src/assets/.DS_Store");
        touch(dir.path(), "src/assets/fonts/.gitkeep");
        touch(dir.path(), "src/assets/.cache/blob.bin");

        let found = scan_sources(dir.path(), &patterns(&["src/assets/**/*"])).unwrap();
        assert_eq!(rels(&found), ["fonts/a.woff2"]);
    }

    #[test]
    fn test_scan_dot_pattern_includes_hidden() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/assets/.well-known/security.txt");
        touch(dir.path(), "src/assets/robots.txt");

        let found = scan_sources(dir.path(), &patterns(&["src/assets/.well-known/*"])).unwrap();
        assert_eq!(rels(&found), ["security.txt"]);
    }
}
