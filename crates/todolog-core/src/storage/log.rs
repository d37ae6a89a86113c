//! Append-only event log file
//!
//! `EventLog` owns `events.json` for the lifetime of a store. It is driven
//! exclusively by the store's control loop, so it needs no locking.
//!
//! States: `Uninitialized` until the data directory and file have been
//! created and replayed, `Open` while servicing appends and syncs, and
//! `Closed` once shut down. A failed initialization leaves the log
//! `Uninitialized` and the next operation tries again.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::fs::{DirBuilder, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::codec;
use super::error::{FileOp, StoreError, StoreResult};
use crate::event::Event;

/// Name of the log file inside the data directory
pub const EVENTS_FILE: &str = "events.json";

enum LogState {
    Uninitialized,
    Open(File),
    Closed,
}

/// Single-writer handle on the log file
pub struct EventLog {
    dir: PathBuf,
    path: PathBuf,
    state: LogState,
}

impl EventLog {
    /// Create a handle; nothing touches the disk yet
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(EVENTS_FILE);
        Self {
            dir,
            path,
            state: LogState::Uninitialized,
        }
    }

    /// Handle that starts out open on `file`, skipping init and replay
    #[cfg(test)]
    pub(crate) fn with_file(dir: impl Into<PathBuf>, file: File) -> Self {
        let mut log = Self::new(dir);
        log.state = LogState::Open(file);
        log
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LogState::Open(_))
    }

    /// Open the file if it is not open yet, replaying its contents
    ///
    /// Historical events are handed to `emit` in file order. A record that
    /// fails to decode ends the replay; it is reported through `emit` as an
    /// `IoError` after the events that preceded it.
    pub async fn ensure_open(&mut self, emit: &mut impl FnMut(Event)) -> StoreResult<&mut File> {
        if let LogState::Uninitialized = self.state {
            let file = self.open_and_replay(emit).await?;
            self.state = LogState::Open(file);
        }
        match &mut self.state {
            LogState::Open(file) => Ok(file),
            _ => Err(StoreError::Closed),
        }
    }

    /// Append one event as a complete record
    pub async fn append(&mut self, event: &Event, emit: &mut impl FnMut(Event)) -> StoreResult<()> {
        let record = codec::encode_to_vec(event)?;
        let path = self.path.clone();
        let file = self.ensure_open(emit).await?;

        file.write_all(&record)
            .await
            .map_err(|e| StoreError::from_io(e, path.clone(), FileOp::Write))?;
        // tokio files buffer writes; flush so failures surface here
        file.flush()
            .await
            .map_err(|e| StoreError::from_io(e, path, FileOp::Write))?;
        Ok(())
    }

    /// Flush the file to durable storage
    pub async fn sync(&mut self, emit: &mut impl FnMut(Event)) -> StoreResult<()> {
        let path = self.path.clone();
        let file = self.ensure_open(emit).await?;
        let result = file.sync_all().await;
        info!(path = %path.display(), ok = result.is_ok(), "data file flushed");
        result.map_err(|e| StoreError::from_io(e, path, FileOp::Sync))
    }

    /// Close the file; the log cannot be used afterwards
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.state, LogState::Closed) {
            LogState::Open(mut file) => {
                let result = file.flush().await;
                drop(file);
                match result {
                    Ok(()) => info!(path = %self.path.display(), "data file closed"),
                    Err(e) => warn!(path = %self.path.display(), error = %e, "data file closed"),
                }
            }
            LogState::Uninitialized => debug!("event log closed before it was opened"),
            LogState::Closed => {}
        }
    }

    async fn open_and_replay(&self, emit: &mut impl FnMut(Event)) -> StoreResult<File> {
        create_data_dir(&self.dir).await?;

        let mut options = OpenOptions::new();
        options.read(true).append(true).create(true);
        #[cfg(unix)]
        options.mode(0o644);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| StoreError::from_io(e, self.path.clone(), FileOp::Open))?;
        info!(path = %self.path.display(), "data file opened");

        self.replay(&mut file, emit).await;
        Ok(file)
    }

    async fn replay(&self, file: &mut File, emit: &mut impl FnMut(Event)) {
        let begin = Instant::now();

        let mut bytes = Vec::new();
        if let Err(e) = file.read_to_end(&mut bytes).await {
            warn!(path = %self.path.display(), error = %e, "replay read failed");
            emit(Event::io_error(StoreError::from_io(
                e,
                self.path.clone(),
                FileOp::Read,
            )));
            return;
        }

        let decoded = codec::read_all(&bytes);
        let count = decoded.events.len();
        for event in decoded.events {
            emit(event);
        }

        if let Some((offset, source)) = decoded.error {
            warn!(path = %self.path.display(), offset, error = %source, "decode error");
            emit(Event::io_error(StoreError::Corrupt {
                path: self.path.clone(),
                offset,
                source,
            }));
        }

        info!(count, elapsed = ?begin.elapsed(), "replay done");
    }
}

async fn create_data_dir(dir: &Path) -> StoreResult<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);

    builder
        .create(dir)
        .await
        .map_err(|source| StoreError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })
}
