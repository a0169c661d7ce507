use dashmap::DashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::paths;
use crate::storage::models::{FileEntry, Folder, MatchedFileGroup};

/// In-memory entity index: the folder tree, a fingerprint lookup map, and
/// the matched-file groups derived from it.
///
/// Single-writer, many-reader: the scanner (or the executor) mutates while
/// UI-side queries read concurrently.
pub struct MemoryStorage {
    /// Every folder ever created, keyed by relative path. Exactly one
    /// folder object exists per distinct path.
    folders: DashMap<String, Arc<Folder>>,
    /// fingerprint → most recently surviving file with that fingerprint.
    by_fingerprint: DashMap<String, Arc<FileEntry>>,
    /// fingerprint → all files sharing it, only while ≥ 2 of them exist.
    matched: DashMap<String, Vec<Arc<FileEntry>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            folders: DashMap::new(),
            by_fingerprint: DashMap::new(),
            matched: DashMap::new(),
        }
    }

    /// Attach a file under its parent folder (created lazily along with
    /// any missing ancestors) and record its fingerprint. The second file
    /// with a given fingerprint forms a [`MatchedFileGroup`]; later ones
    /// join it.
    pub fn add_file(&self, file: Arc<FileEntry>) -> Result<(), Error> {
        let parent = self.get_folder(&paths::parent_path(&file.path))?;
        parent.add_file(file.clone());

        if let Some(existing) = self.by_fingerprint.get(&file.fingerprint).map(|e| e.value().clone()) {
            self.matched
                .entry(file.fingerprint.clone())
                .and_modify(|group| group.push(file.clone()))
                .or_insert_with(|| vec![existing, file.clone()]);
        } else {
            self.by_fingerprint.insert(file.fingerprint.clone(), file);
        }

        Ok(())
    }

    /// Detach a file from its folder and from its fingerprint group. A
    /// group shrinking to one member dissolves; shrinking to zero means the
    /// index was already inconsistent and surfaces as an error.
    pub fn remove_file(&self, file: &Arc<FileEntry>) -> Result<(), Error> {
        let parent = self.get_folder(&paths::parent_path(&file.path))?;
        parent.remove_file(file)?;

        let remaining = match self.matched.get_mut(&file.fingerprint) {
            Some(mut group) => {
                group.retain(|f| !Arc::ptr_eq(f, file));
                Some(group.clone())
            }
            None => None,
        };

        match remaining {
            Some(members) if members.is_empty() => {
                self.matched.remove(&file.fingerprint);
                self.by_fingerprint.remove(&file.fingerprint);
                Err(Error::Invariant(format!(
                    "matched file group became empty for fingerprint {}",
                    file.fingerprint
                )))
            }
            Some(members) => {
                if members.len() == 1 {
                    self.matched.remove(&file.fingerprint);
                }
                self.by_fingerprint
                    .insert(file.fingerprint.clone(), members[0].clone());
                Ok(())
            }
            None => {
                self.by_fingerprint.remove(&file.fingerprint);
                Ok(())
            }
        }
    }

    /// Folder lookup with lazy creation of the full ancestor chain. The
    /// root folder lives at `.` and is created on first use.
    pub fn get_folder(&self, path: &str) -> Result<Arc<Folder>, Error> {
        if let Some(folder) = self.folders.get(path) {
            return Ok(folder.clone());
        }

        if path == "." || path == "/" {
            let root = Folder::new(path, path);
            return Ok(self
                .folders
                .entry(path.to_string())
                .or_insert(root)
                .clone());
        }

        let parent = self.get_folder(&paths::parent_path(path))?;
        let name = paths::base_name(path);

        let folder = self
            .folders
            .entry(path.to_string())
            .or_insert_with(|| {
                let f = Folder::new(name, path);
                f.set_parent(&parent);
                f
            })
            .clone();
        parent.insert_folder(folder.clone());
        Ok(folder)
    }

    /// The `.` folder, creating it when the index is empty.
    pub fn root(&self) -> Result<Arc<Folder>, Error> {
        self.get_folder(".")
    }

    /// Snapshot of every group that currently has ≥ 2 members.
    pub fn matched_groups(&self) -> Vec<MatchedFileGroup> {
        self.matched
            .iter()
            .map(|e| MatchedFileGroup {
                fingerprint: e.key().clone(),
                files: e.value().clone(),
            })
            .collect()
    }

    /// Remove every file record under `folder` and detach the subtree's
    /// folder nodes. Used when an executor task deletes or moves a whole
    /// directory so later similarity recomputation sees the result.
    pub fn remove_folder_tree(&self, folder: &Arc<Folder>) -> Result<(), Error> {
        for file in folder.walk_files() {
            self.remove_file(&file)?;
        }
        self.prune_folder_nodes(folder);
        if let Some(parent) = folder.parent() {
            parent.detach_folder(&folder.name);
        }
        Ok(())
    }

    fn prune_folder_nodes(&self, folder: &Arc<Folder>) {
        for child in folder.folders() {
            self.prune_folder_nodes(&child);
        }
        self.folders.remove(&folder.path);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}
