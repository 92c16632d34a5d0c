//! Data pipeline
//!
//! Paired (MR, CT) slice examples read lazily from per-subject record files,
//! with hygiene filters and restartable dataset combinators:
//!
//! ```text
//! make_zipped_dataset(dir)
//!     .filter(filter_nans)
//!     .filter(filter_incomplete)
//!     .shuffle(2000, seed)
//!     .batch(batch_size)
//!     .repeat(num_epochs)
//! ```

mod dataset;
mod example;
mod filters;
mod zipped;

pub use dataset::{Batched, Dataset, Filter, Repeat, Shuffle, VecDataset};
pub use example::Example;
pub use filters::{filter_incomplete, filter_nans};
pub use zipped::{make_zipped_dataset, Modality, ZippedDataset};
