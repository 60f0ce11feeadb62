use crate::config::SessionSettings;
use crate::session::PlayerScore;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// One finished game as stored in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub date: DateTime<Local>,
    pub points: i64,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
    pub accuracy: Option<f64>,
    pub interval_secs: u8,
    pub length_mins: u8,
}

impl GameRecord {
    pub fn new(score: &PlayerScore, settings: &SessionSettings) -> Self {
        Self {
            date: Local::now(),
            points: score.points,
            correct: score.correct,
            incorrect: score.incorrect,
            skipped: score.skipped,
            accuracy: score.accuracy(),
            interval_secs: settings.spawn_interval_secs,
            length_mins: settings.session_length_mins,
        }
    }
}

/// Append-only CSV log of finished games.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, record: &GameRecord) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the file doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> Result<Vec<GameRecord>, csv::Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        reader.deserialize().collect()
    }

    /// Highest score on record; unreadable history counts as none.
    pub fn best_points(&self) -> Option<i64> {
        self.records()
            .ok()?
            .iter()
            .map(|r| r.points)
            .max()
    }
}
