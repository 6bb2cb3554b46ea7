//! File storage for tasks
//!
//! All tasks live in one JSON file (see [`super::format`]). Every save
//! rewrites the whole file through a temp file and an atomic rename, under an
//! exclusive lock.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use super::format::{self, LoadReport};
use crate::domain::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read task file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write task file: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to lock task file: {}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Store for task data in a single JSON file
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Reads all tasks from the store.
    ///
    /// A missing file is an empty store. Malformed content does not fail the
    /// load; it shows up as warnings in the report.
    pub fn load(&self) -> Result<LoadReport, StoreError> {
        if !self.path.exists() {
            return Ok(LoadReport::default());
        }

        let read_err = |source| StoreError::Read {
            path: self.path.clone(),
            source,
        };

        let mut file = File::open(&self.path).map_err(read_err)?;

        // Acquire shared lock for reading
        file.lock_shared().map_err(|source| StoreError::Lock {
            path: self.path.clone(),
            source,
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(read_err)?;

        // Lock is released when file is dropped
        let text = String::from_utf8_lossy(&bytes);
        Ok(format::parse(&text))
    }

    /// Writes all tasks to the store (full rewrite)
    ///
    /// On failure the destination is untouched and no temp file is left behind.
    pub fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Write to temp file first, then rename over the destination
        let temp_path = self.temp_path();
        let saved = self
            .write_temp(&temp_path, tasks)
            .and_then(|()| fs::rename(&temp_path, &self.path).map_err(write_err));

        if saved.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        saved
    }

    fn write_temp(&self, temp_path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .map_err(write_err)?;

        // Acquire exclusive lock
        file.lock_exclusive().map_err(|source| StoreError::Lock {
            path: temp_path.to_path_buf(),
            source,
        })?;

        let mut writer = BufWriter::new(&file);
        writer
            .write_all(format::render(tasks).as_bytes())
            .map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        drop(writer);

        file.sync_all().map_err(write_err)
    }
}
