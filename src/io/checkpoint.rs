//! Checkpoint files
//!
//! A result directory holds rolling checkpoints and an index:
//!
//! ```text
//! checkpoint.json                    {"latest": ..., "global_step": ..., "all": [...]}
//! model.ckpt-<step>.safetensors      named f32 tensors + string metadata
//! ```

use crate::{Error, Result};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Name of the checkpoint index file
pub const INDEX_FILE: &str = "checkpoint.json";

const GLOBAL_STEP_KEY: &str = "global_step";

/// Contents of `checkpoint.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointIndex {
    /// File name of the newest checkpoint
    pub latest: String,
    /// Global step stored in the newest checkpoint
    pub global_step: u64,
    /// Retained checkpoint files, oldest first
    pub all: Vec<String>,
}

/// A flat f32 tensor with its shape
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Everything stored in one checkpoint file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checkpoint {
    pub global_step: u64,
    pub tensors: BTreeMap<String, NamedTensor>,
    pub metadata: HashMap<String, String>,
}

impl Checkpoint {
    pub fn new(global_step: u64) -> Self {
        Self { global_step, ..Self::default() }
    }

    /// Add a tensor under `name`
    pub fn insert(&mut self, name: impl Into<String>, shape: &[usize], data: Vec<f32>) {
        self.tensors.insert(name.into(), NamedTensor { shape: shape.to_vec(), data });
    }

    /// Look up a tensor, checking that it has the expected shape
    pub fn tensor(&self, name: &str, shape: &[usize]) -> Result<Option<&NamedTensor>> {
        match self.tensors.get(name) {
            Some(t) if t.shape != shape => Err(Error::ShapeMismatch {
                context: format!("checkpoint tensor '{name}'"),
                expected: shape.to_vec(),
                actual: t.shape.clone(),
            }),
            found => Ok(found),
        }
    }

    /// File name used for this checkpoint
    pub fn file_name(&self) -> String {
        format!("model.ckpt-{}.safetensors", self.global_step)
    }
}

/// Encode a checkpoint as safetensors bytes
pub fn encode_checkpoint(checkpoint: &Checkpoint) -> Result<Vec<u8>> {
    let views = checkpoint
        .tensors
        .iter()
        .map(|(name, t)| {
            let bytes: &[u8] = bytemuck::cast_slice(&t.data);
            Ok((name.as_str(), TensorView::new(Dtype::F32, t.shape.clone(), bytes)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut metadata = checkpoint.metadata.clone();
    metadata.insert(GLOBAL_STEP_KEY.to_string(), checkpoint.global_step.to_string());
    Ok(safetensors::serialize(views, &Some(metadata))?)
}

/// Decode safetensors bytes written by [`encode_checkpoint`]
pub fn decode_checkpoint(bytes: &[u8]) -> Result<Checkpoint> {
    let (_, header) = SafeTensors::read_metadata(bytes)?;
    let mut metadata = header.metadata().clone().unwrap_or_default();
    let global_step = metadata
        .remove(GLOBAL_STEP_KEY)
        .ok_or_else(|| Error::Serialization("checkpoint has no global step".into()))?
        .parse::<u64>()
        .map_err(|e| Error::Serialization(format!("invalid global step: {e}")))?;

    let st = SafeTensors::deserialize(bytes)?;
    let mut checkpoint = Checkpoint { global_step, metadata, ..Checkpoint::default() };
    for (name, view) in st.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(Error::Serialization(format!(
                "tensor '{name}' has dtype {:?}, expected F32",
                view.dtype()
            )));
        }
        let data = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        checkpoint.insert(name, view.shape(), data);
    }
    Ok(checkpoint)
}

/// Read the index of a result directory, if one exists
pub fn read_index(dir: &Path) -> Result<Option<CheckpointIndex>> {
    let path = dir.join(INDEX_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

/// Load the newest checkpoint of a result directory
pub fn latest_checkpoint(dir: &Path) -> Result<Option<Checkpoint>> {
    let Some(index) = read_index(dir)? else {
        return Ok(None);
    };
    let bytes = std::fs::read(dir.join(&index.latest))?;
    decode_checkpoint(&bytes).map(Some)
}

/// Write a checkpoint, update the index, and drop all but the `keep` newest
pub fn write_checkpoint(dir: &Path, checkpoint: &Checkpoint, keep: usize) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = checkpoint.file_name();
    let path = dir.join(&name);
    std::fs::write(&path, encode_checkpoint(checkpoint)?)?;

    let mut all = read_index(dir)?.map(|i| i.all).unwrap_or_default();
    all.retain(|f| f != &name);
    all.push(name.clone());
    let excess = all.len().saturating_sub(keep.max(1));
    for stale in all.drain(..excess) {
        match std::fs::remove_file(dir.join(&stale)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
    }

    let index = CheckpointIndex { latest: name, global_step: checkpoint.global_step, all };
    std::fs::write(dir.join(INDEX_FILE), serde_json::to_string_pretty(&index)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(step: u64) -> Checkpoint {
        let mut ckpt = Checkpoint::new(step);
        ckpt.insert("generator/conv_0/kernel", &[1, 1, 1, 2], vec![0.5, -1.5]);
        ckpt.insert("generator/conv_0/bias", &[2], vec![0.0, step as f32]);
        ckpt.metadata.insert("generator/adam/step".into(), "3".into());
        ckpt
    }

    #[test]
    fn test_encode_decode() {
        let ckpt = sample(42);
        let decoded = decode_checkpoint(&encode_checkpoint(&ckpt).unwrap()).unwrap();
        assert_eq!(decoded, ckpt);
    }

    #[test]
    fn test_write_and_restore_latest() {
        let dir = tempdir().unwrap();
        assert!(latest_checkpoint(dir.path()).unwrap().is_none());

        write_checkpoint(dir.path(), &sample(10), 5).unwrap();
        write_checkpoint(dir.path(), &sample(20), 5).unwrap();

        let index = read_index(dir.path()).unwrap().unwrap();
        assert_eq!(index.latest, "model.ckpt-20.safetensors");
        assert_eq!(index.global_step, 20);

        let latest = latest_checkpoint(dir.path()).unwrap().unwrap();
        assert_eq!(latest.global_step, 20);
        assert_eq!(latest.tensors["generator/conv_0/bias"].data, vec![0.0, 20.0]);
    }

    #[test]
    fn test_keeps_newest_files() {
        let dir = tempdir().unwrap();
        for step in 1..=4 {
            write_checkpoint(dir.path(), &sample(step), 2).unwrap();
        }
        let index = read_index(dir.path()).unwrap().unwrap();
        assert_eq!(index.all, vec!["model.ckpt-3.safetensors", "model.ckpt-4.safetensors"]);
        assert!(!dir.path().join("model.ckpt-1.safetensors").exists());
        assert!(dir.path().join("model.ckpt-3.safetensors").exists());
    }

    #[test]
    fn test_rewriting_same_step_is_not_duplicated() {
        let dir = tempdir().unwrap();
        write_checkpoint(dir.path(), &sample(7), 5).unwrap();
        write_checkpoint(dir.path(), &sample(7), 5).unwrap();
        assert_eq!(read_index(dir.path()).unwrap().unwrap().all.len(), 1);
        assert!(dir.path().join("model.ckpt-7.safetensors").exists());
    }

    #[test]
    fn test_shape_checked_lookup() {
        let ckpt = sample(1);
        assert!(ckpt.tensor("generator/conv_0/bias", &[2]).unwrap().is_some());
        assert!(ckpt.tensor("missing", &[2]).unwrap().is_none());
        assert!(matches!(
            ckpt.tensor("generator/conv_0/bias", &[3]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        assert!(matches!(decode_checkpoint(b"not safetensors"), Err(Error::Serialization(_))));
    }
}
