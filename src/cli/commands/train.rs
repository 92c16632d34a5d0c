//! Train command implementation

use crate::config::{HParams, TrainArgs};
use crate::train::{train, TrainConfig};
use tracing::info;

/// Driver configuration for the command line arguments
pub(crate) fn train_config(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        train_path: args.train_path.clone(),
        valid_path: args.valid_path.clone(),
        result_path: args.result_path.clone(),
        num_epochs: args.num_epochs,
        batch_size: args.batch_size as usize,
        ..TrainConfig::default()
    }
}

pub fn run_train(args: TrainArgs) -> Result<(), String> {
    // Overrides are validated before any data is touched.
    let hparams = HParams::parse(&args.hparams).map_err(|e| format!("Config error: {e}"))?;
    let config = train_config(&args);
    info!(hparams = ?hparams, "resolved hyperparameters");

    let report = train(&config, &hparams).map_err(|e| format!("Training error: {e}"))?;
    info!(
        cycles = report.cycles,
        train_steps = report.train_steps,
        valid_steps = report.valid_steps,
        step = report.global_step,
        "training complete"
    );
    Ok(())
}
