//! CLI module
//!
//! Command-line front end for resolving feed hashes.

pub mod args;
pub mod config;

pub use args::CliArgs;
pub use config::Config;
