//! CLI command implementations

mod convert;
mod train;

use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Convert(args) => convert::run_convert(args),
        Command::Train(args) => train::run_train(args),
    }
}
