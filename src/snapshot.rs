use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde::Serialize;
use thiserror::Error;

use crate::world::RenderFrame;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct SnapshotDoc<'a> {
    scenario: &'a str,
    written_at: String,
    frame: &'a RenderFrame,
}

/// Writes the current frame to disk every `interval_ticks` ticks. Interval 0
/// disables snapshotting entirely.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_ticks: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: &Path, interval_ticks: u64) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            interval_ticks,
        }
    }

    pub fn maybe_write(
        &self,
        frame: &RenderFrame,
        scenario_name: &str,
    ) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval_ticks == 0 {
            return Ok(None);
        }
        if frame.tick % self.interval_ticks != 0 {
            return Ok(None);
        }

        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)?;
        let file_path = dir.join(format!("tick_{:06}.json", frame.tick));
        let doc = SnapshotDoc {
            scenario: scenario_name,
            written_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            frame,
        };
        fs::write(&file_path, serde_json::to_string_pretty(&doc)?)?;
        Ok(Some(file_path))
    }
}
