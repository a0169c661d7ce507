use std::fmt;
use std::sync::Arc;

use crate::paths;
use crate::storage::models::{FileEntry, Folder};

/// Kind of filesystem operation a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Move,
    Delete,
    MoveFolder,
    DeleteFolder,
    DeleteEmptyFolder,
}

/// A single planned filesystem operation. Tasks execute strictly in the
/// order the planner emitted them.
#[derive(Debug, Clone)]
pub struct FileActionTask {
    pub action: FileAction,
    pub file: Option<Arc<FileEntry>>,
    pub folder: Option<Arc<Folder>>,
    pub target_folder: Option<Arc<Folder>>,
    pub target_name: Option<String>,
    /// Marks deletions of files that had no duplicate on the other side.
    pub not_duplicate: bool,
}

impl FileActionTask {
    pub fn delete(file: Arc<FileEntry>) -> Self {
        Self {
            action: FileAction::Delete,
            file: Some(file),
            folder: None,
            target_folder: None,
            target_name: None,
            not_duplicate: false,
        }
    }

    pub fn delete_not_duplicate(file: Arc<FileEntry>) -> Self {
        Self {
            not_duplicate: true,
            ..Self::delete(file)
        }
    }

    pub fn move_file(
        file: Arc<FileEntry>,
        target_folder: Arc<Folder>,
        target_name: Option<String>,
    ) -> Self {
        Self {
            action: FileAction::Move,
            file: Some(file),
            folder: None,
            target_folder: Some(target_folder),
            target_name,
            not_duplicate: false,
        }
    }

    pub fn move_folder(folder: Arc<Folder>, target_folder: Arc<Folder>) -> Self {
        Self {
            action: FileAction::MoveFolder,
            file: None,
            folder: Some(folder),
            target_folder: Some(target_folder),
            target_name: None,
            not_duplicate: false,
        }
    }

    pub fn delete_folder(folder: Arc<Folder>) -> Self {
        Self {
            action: FileAction::DeleteFolder,
            file: None,
            folder: Some(folder),
            target_folder: None,
            target_name: None,
            not_duplicate: true,
        }
    }

    pub fn delete_empty_folder(folder: Arc<Folder>) -> Self {
        Self {
            action: FileAction::DeleteEmptyFolder,
            file: None,
            folder: Some(folder),
            target_folder: None,
            target_name: None,
            not_duplicate: false,
        }
    }
}

impl fmt::Display for FileActionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.action, &self.file, &self.folder, &self.target_folder) {
            (FileAction::Move, Some(file), _, Some(target)) => {
                let name = self.target_name.as_deref().unwrap_or(&file.name);
                write!(f, "move {} to {}", file.path, paths::join_rel(&target.path, name))
            }
            (FileAction::Delete, Some(file), _, _) => write!(f, "delete {}", file.path),
            (FileAction::MoveFolder, _, Some(folder), Some(target)) => {
                write!(f, "move folder {} to {}", folder.path, target.path)
            }
            (FileAction::DeleteFolder, _, Some(folder), _) => {
                write!(f, "delete folder {}", folder.path)
            }
            (FileAction::DeleteEmptyFolder, _, Some(folder), _) => {
                write!(f, "delete empty folder {}", folder.path)
            }
            _ => write!(f, "invalid task"),
        }
    }
}
