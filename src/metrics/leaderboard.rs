//! Top-5 high score list shared by human players and agents

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Entries kept after every write
pub const MAX_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

/// JSON-file-backed high score list
#[derive(Debug, Clone)]
pub struct Leaderboard {
    path: PathBuf,
}

impl Leaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries, best first. A missing or unreadable file reads as empty.
    pub fn read(&self) -> Vec<LeaderboardEntry> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(_) => return Vec::new(),
        };

        serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!(path = ?self.path, error = %err, "ignoring unreadable high score file");
            Vec::new()
        })
    }

    /// Add a score, keep the best [`MAX_ENTRIES`], write the file back
    pub fn submit(&self, score: u32, name: impl Into<String>) -> Result<Vec<LeaderboardEntry>> {
        let entries = ranked(
            self.read(),
            LeaderboardEntry {
                name: name.into(),
                score,
            },
        );

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let json = serde_json::to_string(&entries).context("Failed to serialize high scores")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write high scores to {:?}", self.path))?;

        Ok(entries)
    }
}

/// Append `entry` and re-rank. Sorting is stable, so equal scores keep
/// arrival order and a new tie lands below the existing ones.
pub fn ranked(mut entries: Vec<LeaderboardEntry>, entry: LeaderboardEntry) -> Vec<LeaderboardEntry> {
    entries.push(entry);
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(MAX_ENTRIES);
    entries
}

/// Today's date in UTC, as stamped on agent entries
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Leaderboard name for an agent run: `<agent>-<learning cycles>-<YYYYMMDD>`
pub fn agent_entry_name(agent: &str, learning_cycles: u64, date: NaiveDate) -> String {
    format!("{}-{}-{}", agent, learning_cycles, date.format("%Y%m%d"))
}
