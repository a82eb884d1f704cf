//! Shared utilities.

pub mod exec;
mod plural;

pub use plural::{plural_count, plural_s};
