//! Write-behind file storage
//!
//! `WriteBehindStorage` makes durable writes fire-and-forget: `write` updates
//! an in-memory cache and returns immediately, while a background Tokio task
//! persists the document. Reads are served from the cache first, so callers
//! always observe their own latest write even before it reaches disk.
//!
//! # Ordering
//!
//! A single task consumes an unbounded channel, so writes reach the disk in
//! submission order and the last write wins.
//!
//! # Durability
//!
//! Writes still queued when the process dies are lost. `flush` waits for the
//! queue to drain; dropping the storage drains it as well.

use crate::core::traits::KeyValueStorage;
use crate::io::storage::{tmp_path, FileStorage};
use crate::types::StorageError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Command {
    Write { path: PathBuf, contents: String },
    Remove { path: PathBuf },
    Flush(oneshot::Sender<()>),
}

/// File storage whose durable writes happen on a background task
pub struct WriteBehindStorage {
    files: FileStorage,
    /// Latest value per key; `None` records a removal
    cache: RefCell<HashMap<String, Option<String>>>,
    sender: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<JoinHandle<()>>,
    failures: Arc<AtomicUsize>,
    runtime: Runtime,
}

impl WriteBehindStorage {
    /// Open storage rooted at `dir` and start the writer task
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created or the
    /// runtime cannot start.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let files = FileStorage::new(dir)?;
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ledger-writer")
            .build()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let failures = Arc::new(AtomicUsize::new(0));
        let worker = runtime.spawn(run_writer(receiver, Arc::clone(&failures)));

        Ok(WriteBehindStorage {
            files,
            cache: RefCell::new(HashMap::new()),
            sender: Some(sender),
            worker: Some(worker),
            failures,
            runtime,
        })
    }

    /// Wait until every queued write has reached the disk
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WriterClosed` if the writer task has stopped.
    pub fn flush(&self) -> Result<(), StorageError> {
        let (done, finished) = oneshot::channel();
        self.send(Command::Flush(done))?;
        self.runtime
            .block_on(finished)
            .map_err(|_| StorageError::WriterClosed)
    }

    /// Number of background writes that failed so far
    pub fn failed_writes(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Directory holding the documents
    pub fn dir(&self) -> &Path {
        self.files.dir()
    }

    fn send(&self, command: Command) -> Result<(), StorageError> {
        self.sender
            .as_ref()
            .ok_or(StorageError::WriterClosed)?
            .send(command)
            .map_err(|_| StorageError::WriterClosed)
    }
}

impl KeyValueStorage for WriteBehindStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        if let Some(cached) = self.cache.borrow().get(key) {
            return Ok(cached.clone());
        }
        self.files.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.cache
            .borrow_mut()
            .insert(key.to_string(), Some(value.to_string()));
        self.send(Command::Write {
            path: self.files.path_for(key),
            contents: value.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.cache.borrow_mut().insert(key.to_string(), None);
        self.send(Command::Remove {
            path: self.files.path_for(key),
        })
    }
}

impl Drop for WriteBehindStorage {
    fn drop(&mut self) {
        // Closing the channel lets the writer finish the queue and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if self.runtime.block_on(worker).is_err() {
                tracing::error!("write-behind task terminated abnormally");
            }
        }
    }
}

async fn run_writer(mut commands: mpsc::UnboundedReceiver<Command>, failures: Arc<AtomicUsize>) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Write { path, contents } => {
                if let Err(error) = write_file(&path, &contents).await {
                    failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(path = %path.display(), %error, "background ledger write failed");
                }
            }
            Command::Remove { path } => match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(path = %path.display(), %error, "background ledger removal failed");
                }
            },
            Command::Flush(done) => {
                // The flusher may have given up waiting
                let _ = done.send(());
            }
        }
    }
}

async fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}
