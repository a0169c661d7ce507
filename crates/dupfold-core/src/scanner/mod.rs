use chrono::{DateTime, Utc};
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::error;

use crate::error::Error;
use crate::hasher;
use crate::progress::{ScanReporter, SilentReporter};
use crate::storage::models::FileEntry;
use crate::storage::MemoryStorage;

/// Sequential directory walker. Fingerprints every regular file under the
/// root and adds it to storage.
///
/// Dot-prefixed basenames are skipped at any depth (files and directories
/// alike). Cancellation is checked at every entry, so a cancel request
/// aborts within one directory step.
pub struct Scanner<'a> {
    root: PathBuf,
    storage: &'a MemoryStorage,
    ignore_patterns: Vec<Pattern>,
    cancel: Option<Arc<AtomicBool>>,
    reporter: &'a dyn ScanReporter,
}

impl<'a> Scanner<'a> {
    pub fn new(root: impl Into<PathBuf>, storage: &'a MemoryStorage) -> Self {
        Self {
            root: root.into(),
            storage,
            ignore_patterns: Vec::new(),
            cancel: None,
            reporter: &SilentReporter,
        }
    }

    /// Exclude root-relative paths matching any of the given globs.
    /// Invalid patterns are logged and dropped.
    pub fn with_ignore_globs(mut self, globs: &[String]) -> Self {
        self.ignore_patterns = globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ScanReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Walk the tree and populate storage. Returns the number of files
    /// added. The first hard I/O error aborts the scan; permission-denied
    /// directory reads are logged and skipped.
    pub fn scan(&self) -> Result<usize, Error> {
        let root = self.root.canonicalize()?;
        let mut scanned = 0usize;
        self.visit_dir(&root, Path::new(""), &mut scanned)?;
        self.reporter.on_scan_complete(scanned);
        Ok(scanned)
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn visit_dir(&self, abs: &Path, rel: &Path, scanned: &mut usize) -> Result<(), Error> {
        if self.cancelled() {
            return Err(Error::Cancelled);
        }

        let entries = match fs::read_dir(abs) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                error!("Access denied reading directory {}: {}", abs.display(), err);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        for entry in entries {
            if self.cancelled() {
                return Err(Error::Cancelled);
            }

            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let entry_rel = rel.join(&name);
            if self
                .ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(&entry_rel))
            {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.visit_dir(&entry.path(), &entry_rel, scanned)?;
            } else if file_type.is_file() {
                self.scan_file(&entry.path(), &entry_rel, &name)?;
                *scanned += 1;
            }
            // Symlinks and other entry kinds are not traversed.
        }

        Ok(())
    }

    fn scan_file(&self, abs: &Path, rel: &Path, name: &str) -> Result<(), Error> {
        let metadata = fs::metadata(abs)?;
        let modified: DateTime<Utc> = metadata.modified()?.into();

        let fingerprint = hasher::fingerprint_file(abs)?;
        let rel_str = rel.to_string_lossy().into_owned();

        self.storage.add_file(FileEntry::new(
            name,
            rel_str.clone(),
            fingerprint.clone(),
            metadata.len(),
            modified,
        ))?;

        self.reporter.on_file_scanned(&rel_str, &fingerprint);
        Ok(())
    }
}
