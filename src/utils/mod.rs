//! Shared helpers: external commands, HTML tag tables, paths, pluralization.

pub mod exec;
pub mod html;
pub mod path;
mod plural;

pub use plural::plural_count;
