//! Asset files, scanning and content hashing.

mod class;
mod file;
pub mod hash;
mod scan;

pub use class::AssetClass;
pub use file::AssetFile;
pub use scan::{SourceMatch, compile_glob, scan_sources};
