//! Command-line interface module.

mod args;
pub mod prod;

pub use args::{Cli, Commands};
