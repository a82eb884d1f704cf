//! Command-line interface module.

mod args;
pub mod init;
pub mod list;
pub mod prompt;
pub mod run;

pub use args::{Cli, Commands, PathArgs, RunArgs};
