//! Sequential task execution against the filesystem root, with bounded
//! progress reporting, pacing, and cooperative cancellation.

pub mod root;
pub mod task;

use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::Error;
use crate::paths;
use crate::storage::models::{FileEntry, Folder};
use crate::storage::MemoryStorage;

pub use root::{remove_empty_folder, RootHandle};
pub use task::{FileAction, FileActionTask};

/// Messages the UI renders; the core only emits them.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards log messages to the tracing subscriber.
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// One progress record per executed task. `current == total` marks
/// completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Progress sends are non-blocking: the UI polls independently, so a full
/// channel drops the update instead of stalling execution.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 10;

/// Deliberate pause between tasks to keep the UI responsive.
const TASK_PACING: Duration = Duration::from_millis(10);

/// Runs planned tasks in submission order against a root-bound capability,
/// mutating storage in lockstep with the filesystem.
pub struct Executor<'a> {
    storage: &'a MemoryStorage,
    root_path: PathBuf,
    tasks: Vec<FileActionTask>,
    logger: Option<Arc<dyn LogSink>>,
    progress_tx: Sender<ProgressUpdate>,
    progress_rx: Receiver<ProgressUpdate>,
}

impl<'a> Executor<'a> {
    pub fn new(
        storage: &'a MemoryStorage,
        root_path: impl Into<PathBuf>,
        tasks: Vec<FileActionTask>,
        logger: Option<Arc<dyn LogSink>>,
    ) -> Self {
        let (progress_tx, progress_rx) =
            crossbeam_channel::bounded(PROGRESS_CHANNEL_CAPACITY);
        Self {
            storage,
            root_path: root_path.into(),
            tasks,
            logger,
            progress_tx,
            progress_rx,
        }
    }

    /// Receiver for progress updates. Disconnects when the executor is
    /// dropped after the run.
    pub fn progress_channel(&self) -> Receiver<ProgressUpdate> {
        self.progress_rx.clone()
    }

    /// Execute all tasks in order. Cancellation is checked before each
    /// task; already-performed tasks are not rolled back. A
    /// `NotEmptyFolder` result is absorbed (the log message gains a
    /// "(folder is not empty)" suffix); any other error aborts the run.
    pub fn execute(&self, cancel: &AtomicBool) -> Result<(), Error> {
        let root = RootHandle::open(&self.root_path)?;
        let total = self.tasks.len();

        for (i, task) in self.tasks.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }

            let mut result = execute_task(self.storage, &root, task);
            let mut message = task.to_string();

            if matches!(&result, Err(e) if e.is_soft()) {
                message.push_str(" (folder is not empty)");
                result = Ok(());
            }

            let _ = self.progress_tx.try_send(ProgressUpdate {
                current: i + 1,
                total,
                message: message.clone(),
            });

            if let Some(logger) = &self.logger {
                match &result {
                    Ok(()) => logger.info(&format!("Executed task: {}", message)),
                    Err(e) => logger.error(&e.to_string()),
                }
            }

            thread::sleep(TASK_PACING);
            result?;
        }

        Ok(())
    }
}

/// Apply one task to the filesystem and mirror the effect in storage.
pub fn execute_task(
    storage: &MemoryStorage,
    root: &RootHandle,
    task: &FileActionTask,
) -> Result<(), Error> {
    match task.action {
        FileAction::Move => {
            let file = require_file(task)?;
            let target_folder = require_target(task)?;

            let target_name = task
                .target_name
                .clone()
                .unwrap_or_else(|| file.name.clone());
            let target_rel = paths::join_rel(&target_folder.path, &target_name);

            // When the destination already exists the rename replaces it;
            // storage must not end up with two records for one path.
            let existed = root.exists(&target_rel);

            root.rename(&file.path, &target_rel)?;
            storage.remove_file(file)?;

            if !existed {
                storage.add_file(FileEntry::new(
                    target_name,
                    target_rel,
                    file.fingerprint.clone(),
                    file.size,
                    file.modified,
                ))?;
            }
            Ok(())
        }
        FileAction::Delete => {
            let file = require_file(task)?;
            root.remove_file(&file.path)?;
            storage.remove_file(file)
        }
        FileAction::MoveFolder => {
            let folder = require_folder(task)?;
            let target_folder = require_target(task)?;

            let target_rel = paths::join_rel(&target_folder.path, &folder.name);
            if root.exists(&target_rel) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("target folder {} already exists", target_rel),
                )));
            }

            root.rename(&folder.path, &target_rel)?;

            // Re-home every contained file record under the new prefix.
            let moved = folder.walk_files();
            storage.remove_folder_tree(folder)?;
            for file in moved {
                let suffix = Path::new(&file.path)
                    .strip_prefix(&folder.path)
                    .map_err(|_| {
                        Error::Invariant(format!(
                            "file {} not under folder {}",
                            file.path, folder.path
                        ))
                    })?;
                let new_path = Path::new(&target_rel)
                    .join(suffix)
                    .to_string_lossy()
                    .into_owned();
                storage.add_file(FileEntry::new(
                    file.name.clone(),
                    new_path,
                    file.fingerprint.clone(),
                    file.size,
                    file.modified,
                ))?;
            }
            Ok(())
        }
        FileAction::DeleteFolder => {
            let folder = require_folder(task)?;
            root.remove_dir_all(&folder.path)?;
            storage.remove_folder_tree(folder)
        }
        FileAction::DeleteEmptyFolder => {
            let folder = require_folder(task)?;
            remove_empty_folder(root, &folder.path)?;
            storage.remove_folder_tree(folder)
        }
    }
}

fn require_file(task: &FileActionTask) -> Result<&Arc<FileEntry>, Error> {
    task.file
        .as_ref()
        .ok_or_else(|| Error::Invariant(format!("{:?} task without file", task.action)))
}

fn require_folder(task: &FileActionTask) -> Result<&Arc<Folder>, Error> {
    task.folder
        .as_ref()
        .ok_or_else(|| Error::Invariant(format!("{:?} task without folder", task.action)))
}

fn require_target(task: &FileActionTask) -> Result<&Arc<Folder>, Error> {
    task.target_folder
        .as_ref()
        .ok_or_else(|| Error::Invariant(format!("{:?} task without target folder", task.action)))
}
