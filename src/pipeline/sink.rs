//! JSONL output sink with resume support

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::HazmatLabeledItem;

/// What to do when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnExistingOutput {
    /// Read the existing output, skip already-written items, and append.
    Continue,
    /// Truncate and start over.
    Overwrite,
    /// Fail at startup.
    #[default]
    Raise,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("output file already exists: {0}")]
    OutputExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only JSONL sink for labeled items.
///
/// Each write emits one complete JSON line and flushes, so an interrupted
/// run leaves a valid, resumable file.
#[derive(Debug)]
pub struct OutputSink {
    writer: BufWriter<File>,
    already_written: HashSet<String>,
    written: usize,
}

impl OutputSink {
    pub fn open(path: &Path, mode: OnExistingOutput) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let exists = path.exists();
        let (file, already_written) = match mode {
            OnExistingOutput::Raise if exists => {
                return Err(SinkError::OutputExists(path.to_path_buf()));
            }
            OnExistingOutput::Continue if exists => {
                let ids = read_written_ids(path)?;
                tracing::info!(
                    path = %path.display(),
                    resumed_items = ids.len(),
                    "Resuming from existing output"
                );
                (OpenOptions::new().append(true).open(path)?, ids)
            }
            _ => (File::create(path)?, HashSet::new()),
        };

        Ok(Self {
            writer: BufWriter::new(file),
            already_written,
            written: 0,
        })
    }

    /// Item IDs found in a pre-existing output file (empty unless resuming).
    pub fn already_written(&self) -> &HashSet<String> {
        &self.already_written
    }

    /// Append one labeled item as a JSON line and flush.
    pub fn write(&mut self, item: &HazmatLabeledItem) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, item)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of items written during this run (excludes resumed items).
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Collect the item IDs already present in an output file.
///
/// Only the `item_id` field is read, so both labeled items and bare
/// predictions are accepted. A malformed line (for example a partial write
/// from an interrupted run) is skipped with a warning; the item will simply
/// be reprocessed.
fn read_written_ids(path: &Path) -> Result<HashSet<String>, SinkError> {
    #[derive(Deserialize)]
    struct IdOnly {
        item_id: String,
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut ids = HashSet::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<IdOnly>(&line) {
            Ok(record) => {
                ids.insert(record.item_id);
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = line_number + 1,
                    error = %e,
                    "Skipping malformed output line, item will be reprocessed"
                );
            }
        }
    }
    Ok(ids)
}
