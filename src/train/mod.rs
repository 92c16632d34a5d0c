//! Training loop
//!
//! This module drives adversarial training end to end:
//! - Batches stacked from paired examples
//! - A session owning the global step, Adam state and checkpoints
//! - Summary event logs for the training and validation phases
//! - The cycle driver alternating training and validation steps
//!
//! # Example
//!
//! ```no_run
//! use mrtoct::config::HParams;
//! use mrtoct::train::{train, TrainConfig};
//!
//! let hparams = HParams::parse("learn_rate=1e-4,generator=residual").unwrap();
//! let config = TrainConfig { num_epochs: Some(10), ..TrainConfig::default() };
//! let report = train(&config, &hparams).unwrap();
//! println!("stopped at step {}", report.global_step);
//! ```

mod batch;
mod driver;
mod session;
pub mod summary_writer;

pub use batch::Batch;
pub use driver::{train, TrainConfig, TrainReport, HPARAMS_FILE};
pub use session::{CheckpointPolicy, Session};
pub use summary_writer::{read_events, Event, SummaryWriter};
