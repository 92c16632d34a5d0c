//! Summary event logs
//!
//! Each log directory holds an `events.jsonl` file with one JSON object per
//! written summary.

use crate::model::{Summary, SummaryValue};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the event log inside a log directory
pub const EVENTS_FILE: &str = "events.jsonl";

/// One line of an event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub step: u64,
    /// RFC 3339 wall-clock time of the write
    pub wall_time: String,
    pub values: BTreeMap<String, SummaryValue>,
}

/// Appends summaries to `<dir>/events.jsonl`
pub struct SummaryWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl SummaryWriter {
    /// Open (creating if needed) the event log of `dir`
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(EVENTS_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { writer: BufWriter::new(file), path })
    }

    /// Append a summary recorded at `step`
    pub fn add_summary(&mut self, summary: &Summary, step: u64) -> Result<()> {
        let event = Event {
            step,
            wall_time: chrono::Utc::now().to_rfc3339(),
            values: summary.values().iter().cloned().collect(),
        };
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every event of a log file
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            events.push(serde_json::from_str(&line)?);
        }
    }
    Ok(events)
}
