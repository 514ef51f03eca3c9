//! On-disk storage for agent profiles and Q-tables
//!
//! Every agent lives in the agents directory as two files:
//! - `<name>.json` - the [`AgentProfile`] as JSON
//! - `<name>_q_table.bin` - the [`QTable`] as bincode
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous episode's files intact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::config::HyperParameters;
use super::profile::AgentProfile;
use super::q_table::QTable;

const PROFILE_EXTENSION: &str = "json";
const Q_TABLE_SUFFIX: &str = "_q_table.bin";

/// Errors raised by [`AgentStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent `{0}` not found")]
    NotFound(String),

    #[error("agent `{0}` already exists")]
    AlreadyExists(String),

    #[error("invalid agent name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid hyperparameters: {0}")]
    InvalidParameters(String),

    #[error("corrupt data in {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Whether the session should treat this as "no such agent"
    pub fn is_missing_agent(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Corrupt { .. })
    }
}

/// Directory-backed store of agents
#[derive(Debug, Clone)]
pub struct AgentStore {
    dir: PathBuf,
}

impl AgentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PROFILE_EXTENSION}"))
    }

    pub fn q_table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{Q_TABLE_SUFFIX}"))
    }

    /// Names double as file names, so they must be a single plain path component
    pub fn validate_name(name: &str) -> Result<(), StoreError> {
        let reason = if name.trim().is_empty() {
            Some("name is empty")
        } else if name.contains(['/', '\\']) {
            Some("name contains a path separator")
        } else if name.starts_with('.') {
            Some("name starts with a dot")
        } else if name.ends_with(Q_TABLE_SUFFIX.trim_end_matches(".bin")) {
            Some("name ends with the Q-table suffix")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StoreError::InvalidName {
                name: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Create and persist a fresh profile. Existing agents are never overwritten.
    pub fn create_agent(
        &self,
        name: &str,
        params: &HyperParameters,
    ) -> Result<AgentProfile, StoreError> {
        Self::validate_name(name)?;
        params.validate().map_err(StoreError::InvalidParameters)?;

        if self.profile_path(name).exists() {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let profile = AgentProfile::new(name, params);
        self.save_profile(&profile)?;
        Ok(profile)
    }

    /// Load a profile. Missing and unreadable files are distinguished from
    /// other I/O failures so callers can report "agent not found".
    pub fn load_profile(&self, name: &str) -> Result<AgentProfile, StoreError> {
        Self::validate_name(name)?;
        let path = self.profile_path(name);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_str(&json).map_err(|err| StoreError::Corrupt {
            path,
            reason: err.to_string(),
        })
    }

    pub fn save_profile(&self, profile: &AgentProfile) -> Result<(), StoreError> {
        Self::validate_name(&profile.name)?;
        let path = self.profile_path(&profile.name);
        let json = serde_json::to_vec_pretty(profile).map_err(|err| StoreError::Corrupt {
            path: path.clone(),
            reason: err.to_string(),
        })?;

        self.write_atomic(&path, &json)?;
        debug!(agent = %profile.name, path = ?path, "saved agent profile");
        Ok(())
    }

    /// Load an agent's Q-table. A missing or unreadable table is a cold start.
    pub fn load_q_table(&self, name: &str) -> QTable {
        let path = self.q_table_path(name);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(agent = name, "no Q-table on disk, starting empty");
                return QTable::new();
            }
            Err(err) => {
                warn!(agent = name, path = ?path, error = %err, "failed to read Q-table, starting empty");
                return QTable::new();
            }
        };

        match QTable::from_bytes(&bytes) {
            Ok(table) => table,
            Err(err) => {
                warn!(agent = name, path = ?path, error = %err, "corrupt Q-table, starting empty");
                QTable::new()
            }
        }
    }

    pub fn save_q_table(&self, name: &str, table: &QTable) -> Result<(), StoreError> {
        Self::validate_name(name)?;
        let path = self.q_table_path(name);
        let bytes = table.to_bytes().map_err(|err| StoreError::Corrupt {
            path: path.clone(),
            reason: err.to_string(),
        })?;

        self.write_atomic(&path, &bytes)?;
        debug!(
            agent = name,
            states = table.len(),
            entries = table.entry_count(),
            "saved Q-table"
        );
        Ok(())
    }

    /// Names of all stored agents, sorted
    pub fn list_agents(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
