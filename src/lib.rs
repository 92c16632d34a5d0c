//! mrtoct: adversarial MR to CT slice translation
//!
//! Trains a generator mapping MR slices to synthetic CT slices against a
//! discriminator, with the pieces around it:
//! - [`autograd`]: tape-based reverse-mode differentiation over `f32` tensors
//! - [`loss`]: reconstruction and adversarial loss terms
//! - [`data`]: paired slice streams, hygiene filters and lazy combinators
//! - [`model`]: networks, variable scopes and mode-keyed spec builders
//! - [`train`]: session state, checkpoints, summary logs and the driver
//! - [`convert`]: NIfTI volumes to slice records

pub mod autograd;
pub mod cli;
pub mod config;
pub mod convert;
pub mod data;
pub mod error;
pub mod io;
pub mod loss;
pub mod model;
pub mod optim;
pub mod train;

pub use autograd::Tensor;
pub use error::{Error, Result};
