//! File formats: slice records, NIfTI-1 volumes and training checkpoints

pub mod checkpoint;
pub mod nifti;
pub mod record;

pub use checkpoint::{latest_checkpoint, write_checkpoint, Checkpoint, CheckpointIndex};
pub use nifti::read_nifti;
pub use record::{write_records, RecordReader, RecordWriter};
