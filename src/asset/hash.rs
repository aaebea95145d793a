//! Content hashing for cache-busting file names.
//!
//! Uses blake3 over the final transformed bytes, so identical content always
//! yields the identical name.

use super::file::split_name;

/// Hex digest prefix of `contents`, `len` chars long (clamped to 64).
pub fn fingerprint(contents: &[u8], len: usize) -> String {
    let digest = blake3::hash(contents);
    let mut hex = hex::encode(digest.as_bytes());
    hex.truncate(len.min(64));
    hex
}

/// Insert `hash` before the last extension: `css/app.css` -> `css/app-<hash>.css`.
pub fn revisioned_name(path: &str, hash: &str) -> String {
    let (dir, name) = split_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{dir}{stem}-{hash}.{ext}"),
        _ => format!("{dir}{name}-{hash}"),
    }
}
