//! Hash-rename transform (cache busting).

use crate::asset::AssetFile;
use crate::asset::hash::{fingerprint, revisioned_name};
use crate::error::StageError;

use super::Transform;

/// Rename `name.ext` to `name-<hash>.ext` using the content digest.
///
/// Must be the last content-changing step: the hash covers the final bytes.
#[derive(Debug, Clone, Copy)]
pub struct Rev {
    length: usize,
}

impl Rev {
    pub const fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Transform for Rev {
    fn name(&self) -> &'static str {
        "rev"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let hash = fingerprint(&file.contents, self.length);
        let renamed = revisioned_name(&file.output, &hash);
        file.rev_origin = Some(std::mem::replace(&mut file.output, renamed));
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetClass;
    use crate::transform::testing::file;

    #[test]
    fn test_rev_renames_and_records_origin() {
        let out = Rev::new(8)
            .apply(file(AssetClass::Css, "theme/styles.css", "body{color:red}"))
            .unwrap();
        assert_eq!(out.rev_origin.as_deref(), Some("theme/styles.css"));
        let hash = fingerprint(b"body{color:red}", 8);
        assert_eq!(out.output, format!("theme/styles-{hash}.css"));
        assert_eq!(out.rel, "theme/styles.css");
    }

    #[test]
    fn test_rev_is_deterministic() {
        let a = Rev::new(10).apply(file(AssetClass::Js, "a.js", "x=1")).unwrap();
        let b = Rev::new(10).apply(file(AssetClass::Js, "a.js", "x=1")).unwrap();
        assert_eq!(a.output, b.output);
        assert_eq!(a.output.len(), "a-.js".len() + 10);
    }
}
