//! Reference rewriting: replace original asset paths with hashed ones.
//!
//! Keys of all consumed manifests are merged into one table and matched in a
//! single left-to-right pass, longest key first, so the result does not
//! depend on the order manifests are applied in.
//!
//! An occurrence is a reference only when it stands as a path token:
//!
//! ```text
//! href="css/app.css"     key app.css  -> href="css/app-1a2b3c4d.css"
//! href="myapp.css"       key app.css  -> unchanged
//! url(app.css?v=2)       key app.css  -> url(app-1a2b3c4d.css?v=2)
//! logo.png.bak           key logo.png -> unchanged
//! see app.css.           key app.css  -> see app-1a2b3c4d.css.
//! ```
//!
//! When the longest key at a position is not a whole token, shorter keys are
//! tried at the same position before moving on.

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::error::StageError;
use crate::manifest::Manifest;

/// Merged manifest entries and their matcher.
#[derive(Debug)]
pub struct RefTable {
    targets: FxHashMap<String, String>,
    /// Keys, longest first.
    keys: Vec<String>,
    matcher: Option<Regex>,
}

/// Rewritten text and number of replaced references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub replaced: usize,
}

impl RefTable {
    /// Merge manifests into one table.
    ///
    /// The same key in two manifests must map to the same value.
    pub fn build<'a>(manifests: impl IntoIterator<Item = &'a Manifest>) -> Result<Self, StageError> {
        let mut targets: FxHashMap<String, String> = FxHashMap::default();
        for manifest in manifests {
            for (original, hashed) in manifest.iter() {
                if let Some(existing) = targets.get(original) {
                    if existing != hashed {
                        return Err(StageError::ManifestConflict {
                            key: original.to_string(),
                            first: existing.clone(),
                            second: hashed.to_string(),
                        });
                    }
                    continue;
                }
                targets.insert(original.to_string(), hashed.to_string());
            }
        }

        let mut keys: Vec<String> = targets.keys().cloned().collect();
        // Longest first: leftmost-first alternation then prefers the longest key
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let matcher = if keys.is_empty() {
            None
        } else {
            let pattern = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let regex =
                Regex::new(&pattern).map_err(|e| StageError::transform("rewrite", "", e))?;
            Some(regex)
        };

        Ok(Self {
            targets,
            keys,
            matcher,
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Replace every delimited occurrence of a key with its hashed path.
    pub fn rewrite(&self, text: &str) -> Rewritten {
        let Some(matcher) = &self.matcher else {
            return Rewritten {
                text: text.to_string(),
                replaced: 0,
            };
        };

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut pos = 0;
        let mut replaced = 0;

        while let Some(m) = matcher.find_at(text, pos) {
            let start = m.start();
            if let Some(key) = self.token_at(text, start, m.as_str()) {
                out.push_str(&text[last..start]);
                out.push_str(&self.targets[key]);
                last = start + key.len();
                pos = last;
                replaced += 1;
            } else {
                pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
            }
            if pos >= text.len() {
                break;
            }
        }

        out.push_str(&text[last..]);
        Rewritten { text: out, replaced }
    }
}

impl RefTable {
    /// Longest key at `start` that forms a whole token, beginning with the
    /// regex match `longest`.
    fn token_at<'t>(&'t self, text: &str, start: usize, longest: &'t str) -> Option<&'t str> {
        if !is_token_start(text, start) {
            return None;
        }
        if is_token_end(text, start + longest.len()) {
            return Some(longest);
        }
        let rest = &text[start..];
        self.keys
            .iter()
            .map(String::as_str)
            .filter(|k| k.len() < longest.len() && rest.starts_with(k))
            .find(|k| is_token_end(text, start + k.len()))
    }
}

/// Rewrite `text` with the merged entries of `manifests`.
pub fn rewrite<'a>(
    text: &str,
    manifests: impl IntoIterator<Item = &'a Manifest>,
) -> Result<Rewritten, StageError> {
    Ok(RefTable::build(manifests)?.rewrite(text))
}

#[inline]
const fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

fn is_token_start(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !is_path_char(c) && c != '.')
}

/// The next character is not a path character, and a `.` only ends the token
/// when it is not followed by one (`app.css.` vs `app.css.map`).
fn is_token_end(text: &str, end: usize) -> bool {
    let mut rest = text[end..].chars();
    match rest.next() {
        None => true,
        Some('.') => rest.next().is_none_or(|c| !is_path_char(c)),
        Some(c) => !is_path_char(c),
    }
}
