//! CLI module for mrtoct
//!
//! This module contains the command handlers and logging setup.

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::{init_logging, DEFAULT_FILTER};

// Re-export Cli from config for convenience
pub use crate::config::Cli;
