//! Paired dataset over per-subject record files

use super::{Dataset, Example};
use crate::io::record::{RecordReader, EXTENSION};
use crate::Result;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Imaging modality of a record source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modality {
    /// Magnetic resonance, the network input
    Mr,
    /// Computed tomography, the network target
    Ct,
}

impl Modality {
    /// Order in which the converter processes modalities
    pub const ALL: [Modality; 2] = [Modality::Ct, Modality::Mr];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mr => "mr",
            Self::Ct => "ct",
        }
    }

    /// Record file of `subject` for this modality inside `dir`
    pub fn record_path(self, dir: &Path, subject: &str) -> PathBuf {
        dir.join(format!("{subject}-{}.{EXTENSION}", self.as_str()))
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mr" => Ok(Self::Mr),
            "ct" => Ok(Self::Ct),
            other => Err(format!("unknown modality '{other}'")),
        }
    }
}

/// Record sources of one subject; either side may be absent
#[derive(Debug, Clone, Default)]
struct Subject {
    name: String,
    input: Option<PathBuf>,
    target: Option<PathBuf>,
}

/// Lazily zipped (MR, CT) examples of every subject in a directory
#[derive(Debug, Clone)]
pub struct ZippedDataset {
    subjects: Vec<Subject>,
}

impl ZippedDataset {
    /// Subject names in iteration order
    pub fn subjects(&self) -> Vec<&str> {
        self.subjects.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Build the paired example stream for a record directory
///
/// Record files are named `<subject>-<modality>.rec`. Subjects are visited in
/// name order and their MR and CT slices are paired index for index. When one
/// modality runs out first, its side of the pair is an empty slice so the pair
/// is dropped by [`filter_incomplete`](super::filter_incomplete).
pub fn make_zipped_dataset(path: impl AsRef<Path>) -> Result<ZippedDataset> {
    let path = path.as_ref();
    let mut subjects: BTreeMap<String, Subject> = BTreeMap::new();

    for entry in std::fs::read_dir(path)? {
        let file = entry?.path();
        let Some(stem) = record_stem(&file) else {
            debug!(file = %file.display(), "skipping non-record file");
            continue;
        };
        let Some((name, modality)) = stem
            .rsplit_once('-')
            .and_then(|(name, m)| m.parse::<Modality>().ok().map(|m| (name.to_string(), m)))
        else {
            debug!(file = %file.display(), "skipping record without modality suffix");
            continue;
        };

        let subject = subjects.entry(name.clone()).or_default();
        subject.name = name;
        match modality {
            Modality::Mr => subject.input = Some(file),
            Modality::Ct => subject.target = Some(file),
        }
    }

    for subject in subjects.values() {
        if subject.input.is_none() || subject.target.is_none() {
            warn!(subject = %subject.name, "missing a modality, its slices will be dropped");
        }
    }
    debug!(dir = %path.display(), subjects = subjects.len(), "opened record directory");

    Ok(ZippedDataset { subjects: subjects.into_values().collect() })
}

fn record_stem(file: &Path) -> Option<String> {
    if file.extension()? != EXTENSION {
        return None;
    }
    file.file_stem()?.to_str().map(str::to_string)
}

/// Slices of one record file; read failures end the stream
fn slices(path: Option<&Path>) -> Box<dyn Iterator<Item = Array2<f32>>> {
    let Some(path) = path else {
        return Box::new(std::iter::empty());
    };
    match RecordReader::open(path) {
        Ok(reader) => Box::new(
            reader
                .map_while(|slice| {
                    slice.map_err(|e| warn!(error = %e, "stopping record stream")).ok()
                })
                .fuse(),
        ),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "cannot open record file");
            Box::new(std::iter::empty())
        }
    }
}

impl Dataset for ZippedDataset {
    type Item = Example;

    fn iter(&self) -> Box<dyn Iterator<Item = Example> + '_> {
        Box::new(self.subjects.iter().flat_map(|subject| {
            let mut inputs = slices(subject.input.as_deref());
            let mut targets = slices(subject.target.as_deref());
            std::iter::from_fn(move || match (inputs.next(), targets.next()) {
                (None, None) => None,
                (input, target) => Some(Example::new(
                    input.unwrap_or_else(Example::missing),
                    target.unwrap_or_else(Example::missing),
                )),
            })
        }))
    }
}
