//! The single summary artifact slot on disk
//!
//! Writers go through a temp file in the same directory followed by a
//! rename, so a reader sees either the previous artifact or the new one.
//! A snapshot older than the one already written is never saved over it.

use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const SUMMARY_FILE: &str = "summary.svg";

pub struct SummaryStore {
    path: PathBuf,
    /// Refresh time of the snapshot currently on disk, guards every write
    written_as_of: Mutex<Option<DateTime<Utc>>>,
}

impl SummaryStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(SUMMARY_FILE),
            written_as_of: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the artifact with a rendering of the snapshot taken `as_of`.
    ///
    /// Returns `false` without touching the file when a newer snapshot has
    /// already been written.
    pub fn save(&self, bytes: &[u8], as_of: Option<DateTime<Utc>>) -> Result<bool> {
        let mut written_as_of = self.written_as_of.lock();
        if *written_as_of > as_of {
            tracing::debug!(
                "Skipping stale summary snapshot ({:?} older than {:?})",
                as_of,
                *written_as_of
            );
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self
            .path
            .with_extension(format!("svg.{}.tmp", uuid::Uuid::new_v4()));

        let written = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        *written_as_of = as_of;
        tracing::debug!("Summary artifact written to {:?}", self.path);
        Ok(true)
    }

    /// Current artifact bytes, `None` if none has been generated yet
    pub fn load(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
