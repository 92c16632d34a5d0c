//! mrtoct CLI
//!
//! # Usage
//!
//! ```bash
//! # Slice NIfTI subjects into record files
//! mrtoct convert --input-path ../data/nii --output-path ../data/tfrecord
//!
//! # Train with hyperparameter overrides
//! mrtoct train --train-path training --valid-path validation --num-epochs 20 \
//!     --hparams "generator=residual,adv_weight=0.05"
//!
//! # More detail
//! RUST_LOG=mrtoct=debug mrtoct train
//! ```

use clap::Parser;
use mrtoct::cli::{init_logging, run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
