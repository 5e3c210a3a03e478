//! Storage layer for daycard
//!
//! All state lives in a single data directory.
//!
//! # Directory Structure
//!
//! ```text
//! <data_dir>/
//!   daycard.toml           # Optional configuration
//!   session.json           # Signed-in user profile
//!   users.json             # Registry of users
//!   tasks.jsonl            # Append-only task events
//!   tasks.snapshot.json    # Materialized task records
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock;

/// Environment variable the CLI maps onto `--data-dir`
pub const DATA_DIR_ENV: &str = "DAYCARD_DATA_DIR";

/// Fallback directory when no platform data dir is available
pub const FALLBACK_DIR: &str = ".daycard";

/// Storage manager for daycard state
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Resolve the data directory: explicit path (`--data-dir` or
    /// `DAYCARD_DATA_DIR`), then the platform data dir, then `./.daycard`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        if let Some(dir) = explicit {
            return Self::new(dir);
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "daycard", "daycard") {
            return Self::new(dirs.data_dir().to_path_buf());
        }

        Self::new(PathBuf::from(FALLBACK_DIR))
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn tasks_log(&self) -> PathBuf {
        self.data_dir.join("tasks.jsonl")
    }

    pub fn tasks_snapshot(&self) -> PathBuf {
        self.data_dir.join("tasks.snapshot.json")
    }

    /// Create the data directory if needed
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON atomically (temp file + rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content).map_err(|err| {
            Error::OperationFailed(format!("corrupt {}: {err}", path.display()))
        })?;
        Ok(data)
    }

    /// Read JSON data, `None` when the file does not exist
    pub fn read_json_opt<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        self.read_json(path).map(Some)
    }

    /// Append one record to a JSONL file.
    ///
    /// Not atomic on its own; callers hold the file's lock.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Read all records from a JSONL file, skipping blank lines
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line).map_err(|err| {
                Error::OperationFailed(format!(
                    "corrupt {} line {}: {err}",
                    path.display(),
                    index + 1
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }
}
