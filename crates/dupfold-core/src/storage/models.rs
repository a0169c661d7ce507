use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use crate::error::Error;

/// A scanned regular file. Identity is the `Arc` allocation: two entries
/// with equal paths are still distinct records.
#[derive(Debug)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the scan root (root spelled `.`).
    pub path: String,
    /// Opaque content fingerprint; equal fingerprints are treated as
    /// duplicate content everywhere in the system.
    pub fingerprint: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    parent: RwLock<Weak<Folder>>,
}

impl FileEntry {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        fingerprint: impl Into<String>,
        size: u64,
        modified: DateTime<Utc>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            path: path.into(),
            fingerprint: fingerprint.into(),
            size,
            modified,
            parent: RwLock::new(Weak::new()),
        })
    }

    pub fn parent(&self) -> Option<Arc<Folder>> {
        self.parent.read().upgrade()
    }

    pub(crate) fn set_parent(&self, folder: &Arc<Folder>) {
        *self.parent.write() = Arc::downgrade(folder);
    }

    pub(crate) fn clear_parent(&self) {
        *self.parent.write() = Weak::new();
    }
}

/// A folder in the scanned tree. Child maps are concurrent so readers can
/// traverse while a scan or an executor run mutates.
#[derive(Debug)]
pub struct Folder {
    pub name: String,
    pub path: String,
    parent: RwLock<Weak<Folder>>,
    folders: DashMap<String, Arc<Folder>>,
    files: DashMap<String, Arc<FileEntry>>,
    file_count: AtomicI64,
    // Recursive count; 0 means invalid and is recomputed on demand.
    file_count_cache: AtomicI64,
}

impl Folder {
    pub(crate) fn new(name: impl Into<String>, path: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            path: path.into(),
            parent: RwLock::new(Weak::new()),
            folders: DashMap::new(),
            files: DashMap::new(),
            file_count: AtomicI64::new(0),
            file_count_cache: AtomicI64::new(0),
        })
    }

    pub fn parent(&self) -> Option<Arc<Folder>> {
        self.parent.read().upgrade()
    }

    pub(crate) fn set_parent(&self, folder: &Arc<Folder>) {
        *self.parent.write() = Arc::downgrade(folder);
    }

    /// Direct files, unordered.
    pub fn files(&self) -> Vec<Arc<FileEntry>> {
        self.files.iter().map(|e| e.value().clone()).collect()
    }

    /// Direct subfolders, unordered.
    pub fn folders(&self) -> Vec<Arc<Folder>> {
        self.folders.iter().map(|e| e.value().clone()).collect()
    }

    pub fn file(&self, name: &str) -> Option<Arc<FileEntry>> {
        self.files.get(name).map(|e| e.value().clone())
    }

    pub fn folder(&self, name: &str) -> Option<Arc<Folder>> {
        self.folders.get(name).map(|e| e.value().clone())
    }

    pub(crate) fn insert_folder(&self, child: Arc<Folder>) {
        self.folders.insert(child.name.clone(), child);
    }

    pub(crate) fn detach_folder(&self, name: &str) {
        self.folders.remove(name);
    }

    pub(crate) fn add_file(self: &Arc<Self>, file: Arc<FileEntry>) {
        file.set_parent(self);
        self.files.insert(file.name.clone(), file);
        self.file_count.fetch_add(1, Ordering::SeqCst);
        self.invalidate_cache();
    }

    /// Detach a file by identity. Removing a file whose basename is not
    /// stored here (or is stored as a different entry) is an invariant
    /// violation, not a no-op.
    pub(crate) fn remove_file(self: &Arc<Self>, file: &Arc<FileEntry>) -> Result<(), Error> {
        let removed = self
            .files
            .remove_if(&file.name, |_, stored| Arc::ptr_eq(stored, file));
        if removed.is_none() {
            return Err(Error::Invariant(format!(
                "file {} not present in folder {}",
                file.name, self.path
            )));
        }
        file.clear_parent();
        self.file_count.fetch_sub(1, Ordering::SeqCst);
        self.invalidate_cache();
        Ok(())
    }

    /// Number of files directly in this folder.
    pub fn direct_file_count(&self) -> usize {
        self.file_count.load(Ordering::SeqCst).max(0) as usize
    }

    /// Recursive file count, cached until the subtree changes.
    pub fn file_count(&self) -> usize {
        let cached = self.file_count_cache.load(Ordering::SeqCst);
        if cached != 0 {
            return cached as usize;
        }

        let mut count = self.file_count.load(Ordering::SeqCst);
        for child in self.folders.iter() {
            count += child.value().file_count() as i64;
        }
        self.file_count_cache.store(count, Ordering::SeqCst);
        count.max(0) as usize
    }

    /// All files in this subtree, depth-first.
    pub fn walk_files(&self) -> Vec<Arc<FileEntry>> {
        let mut out: Vec<Arc<FileEntry>> = self.files();
        for child in self.folders.iter() {
            out.extend(child.value().walk_files());
        }
        out
    }

    fn invalidate_cache(&self) {
        self.file_count_cache.store(0, Ordering::SeqCst);
        if let Some(parent) = self.parent() {
            parent.invalidate_cache();
        }
    }
}

/// Files sharing one fingerprint. Only materialized while the set has at
/// least two members.
#[derive(Debug, Clone)]
pub struct MatchedFileGroup {
    pub fingerprint: String,
    pub files: Vec<Arc<FileEntry>>,
}
