//! Command-line definitions
//!
//! ```bash
//! mrtoct convert --input-path ../data/nii --output-path ../data/tfrecord
//! mrtoct train --train-path training --valid-path validation --result-path results \
//!     --num-epochs 10 --batch-size 10 --hparams "learn_rate=1e-3,adv_weight=0.05"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MR to CT slice translation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "mrtoct")]
#[command(version)]
#[command(about = "Train a generator translating MR slices into synthetic CT slices")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Convert NIfTI subject directories into paired slice records
    Convert(ConvertArgs),

    /// Train the adversarial generator
    Train(TrainArgs),
}

/// Arguments for the convert command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ConvertArgs {
    /// Directory holding one subdirectory per subject with ct.nii and mr.nii
    #[arg(long, default_value = "../data/nii")]
    pub input_path: PathBuf,

    /// Directory receiving `<subject>-<modality>.rec` files
    #[arg(long, default_value = "../data/tfrecord")]
    pub output_path: PathBuf,
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Record directory of the training subjects
    #[arg(long, default_value = "training")]
    pub train_path: PathBuf,

    /// Record directory of the validation subjects
    #[arg(long, default_value = "validation")]
    pub valid_path: PathBuf,

    /// Directory for checkpoints and summaries
    #[arg(long, default_value = "results")]
    pub result_path: PathBuf,

    /// Passes over the training data; unbounded when omitted
    #[arg(long)]
    pub num_epochs: Option<usize>,

    /// Examples per batch
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,

    /// Hyperparameter overrides, e.g. "learn_rate=1e-3,mse_weight=0.5"
    #[arg(long, default_value = "")]
    pub hparams: String,
}

/// Parse command line arguments
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
