//! Configuration: hyperparameters and command-line definitions

pub mod cli;
mod hparams;

pub use cli::{parse_args, Cli, Command, ConvertArgs, TrainArgs};
pub use hparams::HParams;
