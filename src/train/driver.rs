//! Training driver
//!
//! Alternates fixed-length training phases with short validation runs
//! until the session stops, logging every step's summary.

use super::{Batch, CheckpointPolicy, Session, SummaryWriter};
use crate::config::HParams;
use crate::data::{filter_incomplete, filter_nans, make_zipped_dataset, Dataset, Example};
use crate::model::{create_generative_adversarial_network, GanStage, Mode, Networks};
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// File the resolved hyperparameters are written to
pub const HPARAMS_FILE: &str = "hparams.json";

/// Driver configuration
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Directory of training records
    pub train_path: PathBuf,
    /// Directory of validation records
    pub valid_path: PathBuf,
    /// Checkpoints, summaries and hparams are written here
    pub result_path: PathBuf,
    /// Passes over the training data, unbounded with `None`
    pub num_epochs: Option<usize>,
    pub batch_size: usize,
    /// Training steps per cycle
    pub train_steps: usize,
    /// Validation steps per cycle
    pub valid_steps: usize,
    pub shuffle_buffer: usize,
    /// Seeds weight initialization and shuffling
    pub seed: u64,
    pub checkpoint: CheckpointPolicy,
    /// Stop once the global step reaches this value
    pub max_steps: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("training"),
            valid_path: PathBuf::from("validation"),
            result_path: PathBuf::from("results"),
            num_epochs: None,
            batch_size: 10,
            train_steps: 50,
            valid_steps: 5,
            shuffle_buffer: 2000,
            seed: 42,
            checkpoint: CheckpointPolicy::default(),
            max_steps: None,
        }
    }
}

/// What a finished run did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainReport {
    /// Cycles started
    pub cycles: usize,
    pub train_steps: usize,
    pub valid_steps: usize,
    pub global_step: u64,
    /// Generator loss of the last step
    pub last_gloss: Option<f32>,
    /// Discriminator loss of the last step
    pub last_dloss: Option<f32>,
}

impl TrainReport {
    fn record(&mut self, losses: (f32, f32)) {
        self.last_gloss = Some(losses.0);
        self.last_dloss = Some(losses.1);
    }
}

/// Train the adversarial networks until the session stops
///
/// The training stream keeps its position across cycles rather than being
/// reset to its start at each cycle, so `num_epochs` bounds the run: its end
/// requests a stop. The validation stream restarts every cycle and must
/// supply all of its steps.
pub fn train(config: &TrainConfig, hparams: &HParams) -> Result<TrainReport> {
    let networks = Networks::build(hparams, config.seed);
    let mut session = Session::open(
        &config.result_path,
        config.checkpoint.clone(),
        config.max_steps,
        &networks.scopes(),
    )?;
    hparams.save_json(config.result_path.join(HPARAMS_FILE))?;

    let train_set = make_zipped_dataset(&config.train_path)?
        .filter(filter_nans)
        .filter(filter_incomplete)
        .shuffle(config.shuffle_buffer, config.seed)
        .batch(config.batch_size)
        .repeat(config.num_epochs);
    let valid_set = make_zipped_dataset(&config.valid_path)?
        .filter(filter_nans)
        .filter(filter_incomplete)
        .batch(config.batch_size)
        .repeat(None);

    let mut train_log = SummaryWriter::create(config.result_path.join("training"))?;
    let mut valid_log = SummaryWriter::create(config.result_path.join("validation"))?;

    info!(
        train = %config.train_path.display(),
        valid = %config.valid_path.display(),
        result = %config.result_path.display(),
        step = session.global_step(),
        "starting training"
    );

    let mut report = TrainReport::default();
    let mut train_batches = train_set.iter();

    while !session.should_stop() {
        report.cycles += 1;
        debug!(cycle = report.cycles, "training phase");

        for _ in 0..config.train_steps {
            if session.should_stop() {
                break;
            }
            let Some(examples) = train_batches.next() else {
                if report.train_steps == 0 {
                    return Err(Error::DatasetExhausted(format!(
                        "no training batches in {}",
                        config.train_path.display()
                    )));
                }
                info!(steps = report.train_steps, "training data exhausted, stopping");
                session.request_stop();
                break;
            };
            report.record(run_step(&examples, hparams, &networks, &mut session, &mut train_log)?);
            report.train_steps += 1;
        }
        train_log.flush()?;

        debug!(cycle = report.cycles, "validation phase");
        let mut valid_batches = valid_set.iter();
        for done in 0..config.valid_steps {
            if session.should_stop() {
                break;
            }
            let examples = valid_batches.next().ok_or_else(|| {
                Error::DatasetExhausted(format!(
                    "validation stream in {} ended after {done} of {} steps",
                    config.valid_path.display(),
                    config.valid_steps
                ))
            })?;
            report.record(run_step(&examples, hparams, &networks, &mut session, &mut valid_log)?);
            report.valid_steps += 1;
        }
        valid_log.flush()?;

        info!(
            cycle = report.cycles,
            step = session.global_step(),
            gloss = report.last_gloss,
            dloss = report.last_dloss,
            "finished cycle"
        );
    }

    report.global_step = session.global_step();
    session.close()?;
    info!(step = report.global_step, "training finished");
    Ok(report)
}

/// Run the joint update on one batch and log its summary
///
/// Returns the generator and discriminator losses computed before the update.
fn run_step(
    examples: &[Example],
    hparams: &HParams,
    networks: &Networks,
    session: &mut Session,
    log: &mut SummaryWriter,
) -> Result<(f32, f32)> {
    let batch = Batch::from_examples(examples)?;
    let spec = create_generative_adversarial_network(
        &batch.inputs,
        &batch.targets,
        Mode::Train,
        hparams,
        networks,
    );
    let GanStage::Train(objective, op) = &spec.stage else {
        return Err(Error::Config("train mode spec has no train op".into()));
    };

    let step = session.global_step();
    op.run(session)?;
    log.add_summary(&objective.summary, step)?;
    session.maybe_save()?;
    Ok((objective.gloss.item(), objective.dloss.item()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Modality;
    use crate::io::write_records;
    use crate::train::summary_writer::{read_events, EVENTS_FILE};
    use ndarray::Array2;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_subject(dir: &Path, subject: &str, slices: usize) {
        std::fs::create_dir_all(dir).unwrap();
        for modality in Modality::ALL {
            let data: Vec<Array2<f32>> = (0..slices)
                .map(|i| Array2::from_elem((4, 4), i as f32 / slices as f32))
                .collect();
            write_records(modality.record_path(dir, subject), data.iter().map(|a| a.view()))
                .unwrap();
        }
    }

    fn config(root: &Path) -> TrainConfig {
        TrainConfig {
            train_path: root.join("training"),
            valid_path: root.join("validation"),
            result_path: root.join("results"),
            batch_size: 2,
            train_steps: 3,
            valid_steps: 1,
            checkpoint: CheckpointPolicy::never(),
            ..TrainConfig::default()
        }
    }

    fn hparams() -> HParams {
        HParams::parse("num_filters=2").unwrap()
    }

    #[test]
    fn test_epochs_bound_the_run() {
        let root = tempdir().unwrap();
        let cfg = TrainConfig { num_epochs: Some(2), ..config(root.path()) };
        write_subject(&cfg.train_path, "s01", 4);
        write_subject(&cfg.valid_path, "s02", 2);

        let report = train(&cfg, &hparams()).unwrap();
        // 2 epochs of 2 batches: 3 steps in cycle one, 1 in cycle two.
        assert_eq!(report.train_steps, 4);
        assert_eq!(report.cycles, 2);
        assert_eq!(report.valid_steps, 1);
        assert_eq!(report.global_step, 5);
        assert!(report.last_gloss.is_some_and(f32::is_finite));

        let events = read_events(cfg.result_path.join("training").join(EVENTS_FILE)).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].step, 0);
        assert!(cfg.result_path.join(HPARAMS_FILE).exists());
        assert!(cfg.result_path.join("checkpoint.json").exists());
    }

    #[test]
    fn test_max_steps_stops_and_resume_continues() {
        let root = tempdir().unwrap();
        let cfg = TrainConfig { max_steps: Some(4), ..config(root.path()) };
        write_subject(&cfg.train_path, "s01", 4);
        write_subject(&cfg.valid_path, "s02", 2);

        let first = train(&cfg, &hparams()).unwrap();
        assert_eq!((first.train_steps, first.valid_steps, first.global_step), (3, 1, 4));

        let cfg = TrainConfig { max_steps: Some(8), ..cfg };
        let second = train(&cfg, &hparams()).unwrap();
        assert_eq!(second.global_step, 8);
        assert_eq!(second.train_steps, 3);
    }

    #[test]
    fn test_empty_training_data_is_exhaustion() {
        let root = tempdir().unwrap();
        let cfg = config(root.path());
        std::fs::create_dir_all(&cfg.train_path).unwrap();
        write_subject(&cfg.valid_path, "s02", 2);
        assert!(matches!(train(&cfg, &hparams()), Err(Error::DatasetExhausted(_))));
    }

    #[test]
    fn test_empty_validation_data_is_exhaustion() {
        let root = tempdir().unwrap();
        let cfg = config(root.path());
        write_subject(&cfg.train_path, "s01", 4);
        std::fs::create_dir_all(&cfg.valid_path).unwrap();
        assert!(matches!(train(&cfg, &hparams()), Err(Error::DatasetExhausted(_))));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let root = tempdir().unwrap();
        let cfg = config(root.path());
        assert!(matches!(train(&cfg, &hparams()), Err(Error::Io(_))));
    }
}
