//! Reconciled merge view of a folder pair and the translation of per-row
//! user intents into ordered filesystem tasks.

use std::sync::Arc;

use crate::analysis::similarity::{matched_file_pairs, FolderSimilarity, SimilarityIndex};
use crate::executor::task::FileActionTask;
use crate::storage::models::{FileEntry, Folder};

/// Per-row merge intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeAction {
    #[default]
    None,
    DeleteRight,
    DeleteLeft,
    MoveToRight,
    MoveToLeft,
}

/// Which sides of a row exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    BothSides,
    OnlyLeft,
    OnlyRight,
}

/// The folder references behind a folder row. Match kind is derived from
/// the variant, so a row can never claim sides it does not carry.
#[derive(Debug, Clone)]
pub enum MergeSides {
    Both {
        left: FolderSimilarity,
        right: FolderSimilarity,
    },
    OnlyLeft(Arc<Folder>),
    OnlyRight(Arc<Folder>),
}

impl MergeSides {
    pub fn match_kind(&self) -> MatchKind {
        match self {
            MergeSides::Both { .. } => MatchKind::BothSides,
            MergeSides::OnlyLeft(_) => MatchKind::OnlyLeft,
            MergeSides::OnlyRight(_) => MatchKind::OnlyRight,
        }
    }
}

/// A file row: matched pair, or a file present on one side only.
#[derive(Debug, Clone)]
pub struct MergeFilePair {
    pub left: Option<Arc<FileEntry>>,
    pub right: Option<Arc<FileEntry>>,
    pub action: MergeAction,
}

impl MergeFilePair {
    /// Assign an action, normalizing impossible or degenerate choices: a
    /// one-sided row silently drops the two meaningless actions, and moving
    /// one member of a matched pair onto the other is a delete of the
    /// source.
    pub fn set_action(&mut self, action: MergeAction) {
        self.action = normalize_file_action(action, self.left.is_some(), self.right.is_some());
    }

    pub fn match_kind(&self) -> MatchKind {
        match (&self.left, &self.right) {
            (Some(_), None) => MatchKind::OnlyLeft,
            (None, Some(_)) => MatchKind::OnlyRight,
            _ => MatchKind::BothSides,
        }
    }

    fn action_task(
        &self,
        left_folder: &Arc<Folder>,
        right_folder: &Arc<Folder>,
    ) -> Option<FileActionTask> {
        match self.action {
            MergeAction::None => None,
            MergeAction::DeleteRight => Some(FileActionTask::delete(self.right.clone()?)),
            MergeAction::DeleteLeft => Some(FileActionTask::delete(self.left.clone()?)),
            MergeAction::MoveToRight => {
                let target_name = self.right.as_ref().map(|f| f.name.clone());
                Some(FileActionTask::move_file(
                    self.left.clone()?,
                    right_folder.clone(),
                    target_name,
                ))
            }
            MergeAction::MoveToLeft => {
                let target_name = self.left.as_ref().map(|f| f.name.clone());
                Some(FileActionTask::move_file(
                    self.right.clone()?,
                    left_folder.clone(),
                    target_name,
                ))
            }
        }
    }
}

fn normalize_file_action(action: MergeAction, has_left: bool, has_right: bool) -> MergeAction {
    match action {
        MergeAction::MoveToLeft | MergeAction::DeleteRight if !has_right => MergeAction::None,
        MergeAction::MoveToRight | MergeAction::DeleteLeft if !has_left => MergeAction::None,
        MergeAction::MoveToLeft if has_left => MergeAction::DeleteRight,
        MergeAction::MoveToRight if has_right => MergeAction::DeleteLeft,
        other => other,
    }
}

fn normalize_folder_action(action: MergeAction, kind: MatchKind) -> MergeAction {
    match kind {
        MatchKind::OnlyLeft
            if matches!(action, MergeAction::MoveToLeft | MergeAction::DeleteRight) =>
        {
            MergeAction::None
        }
        MatchKind::OnlyRight
            if matches!(action, MergeAction::MoveToRight | MergeAction::DeleteLeft) =>
        {
            MergeAction::None
        }
        _ => action,
    }
}

/// A folder row: the reconciled view of two folders (or of a folder present
/// on one side only), with file rows and recursive subfolder rows.
#[derive(Debug, Clone)]
pub struct MergeFolderPair {
    pub sides: MergeSides,
    pub action: MergeAction,
    pub file_rows: Vec<MergeFilePair>,
    pub folder_rows: Vec<MergeFolderPair>,
}

impl MergeFolderPair {
    pub fn match_kind(&self) -> MatchKind {
        self.sides.match_kind()
    }

    /// Assign an action to this row, normalized for its match kind.
    pub fn set_action(&mut self, action: MergeAction) {
        self.action = normalize_folder_action(action, self.match_kind());
    }

    /// Assign an action to every row of this pair (not the pair itself),
    /// with per-row normalization.
    pub fn set_all_actions(&mut self, action: MergeAction) {
        for row in &mut self.file_rows {
            row.set_action(action);
        }
        for row in &mut self.folder_rows {
            row.set_action(action);
        }
    }

    pub fn clear_all_actions(&mut self) {
        self.action = MergeAction::None;
        for row in &mut self.file_rows {
            row.action = MergeAction::None;
        }
        for row in &mut self.folder_rows {
            row.action = MergeAction::None;
        }
    }

    /// Translate this pair into an ordered task list: the root row's own
    /// cascade when it carries an action, otherwise each row's individual
    /// action; always followed by empty-folder cleanup of both compared
    /// roots.
    pub fn plan(&self) -> Vec<FileActionTask> {
        let (left, right) = match &self.sides {
            MergeSides::Both { left, right } => (left, right),
            // One-sided rows only occur nested under a two-sided root.
            _ => return Vec::new(),
        };

        let mut tasks = Vec::new();
        if self.action != MergeAction::None {
            tasks.extend(self.tasks_with_action(self.action, &left.folder, &right.folder));
        } else {
            for row in &self.file_rows {
                if let Some(task) = row.action_task(&left.folder, &right.folder) {
                    tasks.push(task);
                }
            }
            for row in &self.folder_rows {
                tasks.extend(row.tasks_with_action(row.action, &left.folder, &right.folder));
            }
        }

        tasks.push(FileActionTask::delete_empty_folder(left.folder.clone()));
        tasks.push(FileActionTask::delete_empty_folder(right.folder.clone()));
        tasks
    }

    /// Generate tasks for this row under `action`. Two-sided rows cascade
    /// the action into their subfolder rows and regenerate their file
    /// reconciliation; one-sided rows move or delete the whole folder,
    /// targeting the enclosing pair's opposite side.
    fn tasks_with_action(
        &self,
        action: MergeAction,
        parent_left: &Arc<Folder>,
        parent_right: &Arc<Folder>,
    ) -> Vec<FileActionTask> {
        let action = normalize_folder_action(action, self.match_kind());
        if action == MergeAction::None {
            return Vec::new();
        }

        match &self.sides {
            MergeSides::Both { left, right } => {
                let mut tasks = Vec::new();

                for row in &self.folder_rows {
                    tasks.extend(row.tasks_with_action(action, &left.folder, &right.folder));
                }

                let (matched, left_only, right_only) =
                    matched_file_pairs(&left.folder, &right.folder);

                match action {
                    MergeAction::DeleteRight => {
                        for (_, file) in matched {
                            tasks.push(FileActionTask::delete(file));
                        }
                        for file in right_only {
                            tasks.push(FileActionTask::delete_not_duplicate(file));
                        }
                        tasks.push(FileActionTask::delete_empty_folder(right.folder.clone()));
                    }
                    MergeAction::DeleteLeft => {
                        for (file, _) in matched {
                            tasks.push(FileActionTask::delete(file));
                        }
                        for file in left_only {
                            tasks.push(FileActionTask::delete_not_duplicate(file));
                        }
                        tasks.push(FileActionTask::delete_empty_folder(left.folder.clone()));
                    }
                    MergeAction::MoveToRight => {
                        for (file, _) in matched {
                            tasks.push(FileActionTask::delete(file));
                        }
                        for file in left_only {
                            tasks.push(FileActionTask::move_file(file, right.folder.clone(), None));
                        }
                        tasks.push(FileActionTask::delete_empty_folder(left.folder.clone()));
                    }
                    MergeAction::MoveToLeft => {
                        for (_, file) in matched {
                            tasks.push(FileActionTask::delete(file));
                        }
                        for file in right_only {
                            tasks.push(FileActionTask::move_file(file, left.folder.clone(), None));
                        }
                        tasks.push(FileActionTask::delete_empty_folder(right.folder.clone()));
                    }
                    MergeAction::None => unreachable!(),
                }

                tasks
            }
            MergeSides::OnlyLeft(folder) => match action {
                MergeAction::DeleteLeft => vec![FileActionTask::delete_folder(folder.clone())],
                MergeAction::MoveToRight => {
                    vec![FileActionTask::move_folder(folder.clone(), parent_right.clone())]
                }
                _ => Vec::new(),
            },
            MergeSides::OnlyRight(folder) => match action {
                MergeAction::DeleteRight => vec![FileActionTask::delete_folder(folder.clone())],
                MergeAction::MoveToLeft => {
                    vec![FileActionTask::move_folder(folder.clone(), parent_left.clone())]
                }
                _ => Vec::new(),
            },
        }
    }
}

impl SimilarityIndex {
    /// Build the recursive merge view for an oriented folder pair: file
    /// rows from the fingerprint reconciliation (matched, then left-only,
    /// then right-only) and folder rows from greedy child matching, with
    /// matched child pairs expanded recursively.
    pub fn generate_merge_pair(
        &self,
        left: &FolderSimilarity,
        right: &FolderSimilarity,
    ) -> MergeFolderPair {
        let (matched, left_files, right_files) =
            matched_file_pairs(&left.folder, &right.folder);

        let mut file_rows = Vec::new();
        for (l, r) in matched {
            file_rows.push(MergeFilePair {
                left: Some(l),
                right: Some(r),
                action: MergeAction::None,
            });
        }
        for file in left_files {
            file_rows.push(MergeFilePair {
                left: Some(file),
                right: None,
                action: MergeAction::None,
            });
        }
        for file in right_files {
            file_rows.push(MergeFilePair {
                left: None,
                right: Some(file),
                action: MergeAction::None,
            });
        }

        let (matched_folders, left_folders, right_folders) =
            self.child_match(&left.folder, &right.folder);

        let mut folder_rows = Vec::new();
        for (l, r) in matched_folders {
            folder_rows.push(self.generate_merge_pair(&l, &r));
        }
        for folder in left_folders {
            folder_rows.push(MergeFolderPair {
                sides: MergeSides::OnlyLeft(folder),
                action: MergeAction::None,
                file_rows: Vec::new(),
                folder_rows: Vec::new(),
            });
        }
        for folder in right_folders {
            folder_rows.push(MergeFolderPair {
                sides: MergeSides::OnlyRight(folder),
                action: MergeAction::None,
                file_rows: Vec::new(),
                folder_rows: Vec::new(),
            });
        }

        MergeFolderPair {
            sides: MergeSides::Both {
                left: left.clone(),
                right: right.clone(),
            },
            action: MergeAction::None,
            file_rows,
            folder_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sided_file_rows_drop_meaningless_actions() {
        let file = FileEntry::new("x", "a/x", "fp", 1, chrono::Utc::now());
        let mut row = MergeFilePair {
            left: Some(file),
            right: None,
            action: MergeAction::None,
        };

        row.set_action(MergeAction::MoveToLeft);
        assert_eq!(row.action, MergeAction::None);
        row.set_action(MergeAction::DeleteRight);
        assert_eq!(row.action, MergeAction::None);
        row.set_action(MergeAction::MoveToRight);
        assert_eq!(row.action, MergeAction::MoveToRight);
        row.set_action(MergeAction::DeleteLeft);
        assert_eq!(row.action, MergeAction::DeleteLeft);
    }

    #[test]
    fn moving_one_duplicate_onto_the_other_is_a_delete() {
        let left = FileEntry::new("x", "a/x", "fp", 1, chrono::Utc::now());
        let right = FileEntry::new("x", "b/x", "fp", 1, chrono::Utc::now());
        let mut row = MergeFilePair {
            left: Some(left),
            right: Some(right),
            action: MergeAction::None,
        };

        row.set_action(MergeAction::MoveToLeft);
        assert_eq!(row.action, MergeAction::DeleteRight);
        row.set_action(MergeAction::MoveToRight);
        assert_eq!(row.action, MergeAction::DeleteLeft);
    }
}
