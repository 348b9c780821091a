//! `probe` command-line client.
//!
//! Argument parsing, configuration, logging and terminal rendering around the
//! session engine in `probe-core`. Kept apart from main.rs for integration
//! testing.

pub mod cli;
pub mod config;
pub mod logging;
pub mod view;
