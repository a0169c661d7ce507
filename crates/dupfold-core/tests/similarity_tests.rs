use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use dupfold_core::analysis::{
    matched_file_pairs, pair_key, MatchKind, MergeAction, MergeSides, SimilarityIndex,
};
use dupfold_core::storage::models::FileEntry;
use dupfold_core::MemoryStorage;

fn add(storage: &MemoryStorage, path: &str, fingerprint: &str) {
    let name = path.rsplit('/').next().unwrap_or(path);
    storage
        .add_file(FileEntry::new(name, path, fingerprint, 100, Utc::now()))
        .unwrap();
}

#[test]
fn pair_keys_are_orientation_free() {
    assert_eq!(pair_key("p/a", "q/b"), pair_key("q/b", "p/a"));
}

#[test]
fn trivial_duplicate_pair() {
    // S1: ./a/x and ./b/x with identical content.
    let storage = MemoryStorage::new();
    add(&storage, "a/x", "hx");
    add(&storage, "b/x", "hx");

    let index = SimilarityIndex::calculate(&storage);

    let groups = index.groups_for("a");
    assert_eq!(groups.len(), 1);
    let (own, other) = &groups[0];
    assert_eq!(own.path(), "a");
    assert_eq!(other.path(), "b");
    assert_eq!(own.duplicate_file_count, 1);
    assert_eq!(own.file_count, 1);
    assert_eq!(own.duplicated_percentage(), 100.0);
    assert_eq!(other.duplicate_file_count, 1);
    assert_eq!(other.duplicated_percentage(), 100.0);
}

#[test]
fn oriented_accessors_ignore_storage_order() {
    let storage = MemoryStorage::new();
    add(&storage, "a/x", "hx");
    add(&storage, "b/x", "hx");

    let index = SimilarityIndex::calculate(&storage);

    let (first, second) = index.pair("b", "a").unwrap();
    assert_eq!(first.path(), "b");
    assert_eq!(second.path(), "a");

    let (first, second) = index.pair("a", "b").unwrap();
    assert_eq!(first.path(), "a");
    assert_eq!(second.path(), "b");
}

#[test]
fn ancestor_propagation() {
    // S2: ./p/a/{x,y} and ./q/b/{x,y}, pairwise identical.
    let storage = MemoryStorage::new();
    add(&storage, "p/a/x", "hx");
    add(&storage, "q/b/x", "hx");
    add(&storage, "p/a/y", "hy");
    add(&storage, "q/b/y", "hy");

    let index = SimilarityIndex::calculate(&storage);

    let (own, other) = index.pair("p/a", "q/b").unwrap();
    assert_eq!(own.duplicate_file_count, 2);
    assert_eq!(other.duplicate_file_count, 2);

    let (own, other) = index.pair("p", "q").unwrap();
    assert_eq!(own.duplicate_file_count, 2);
    assert_eq!(other.duplicate_file_count, 2);

    let (own, other) = index.pair("p/a", "q").unwrap();
    assert_eq!(own.path(), "p/a");
    assert_eq!(own.duplicate_file_count, 2);
    assert_eq!(other.duplicate_file_count, 2);

    // Every stored pair has both sides non-zero.
    for folder in index.similar_folders() {
        for (own, other) in index.groups_for(&folder) {
            assert!(own.duplicate_file_count > 0);
            assert!(other.duplicate_file_count > 0);
        }
    }
}

#[test]
fn no_same_folder_pairs() {
    let storage = MemoryStorage::new();
    add(&storage, "a/x1", "h");
    add(&storage, "a/x2", "h");
    add(&storage, "b/x", "h");

    let index = SimilarityIndex::calculate(&storage);

    for (own, other) in index.groups_for("a") {
        assert_ne!(own.path(), other.path());
    }
    // The same-folder duplicate still exists as a matched group; it just
    // produces no (a, a) pair.
    assert!(index.contains_group("a"));
    assert!(index.contains_group("b"));
}

#[test]
fn groups_are_sorted_by_own_percentage_first() {
    let storage = MemoryStorage::new();
    // a↔b share two files (100% of a), a↔c share one (50% of a).
    add(&storage, "a/x", "h1");
    add(&storage, "a/y", "h2");
    add(&storage, "b/x", "h1");
    add(&storage, "b/y", "h2");
    add(&storage, "c/x", "h1");
    add(&storage, "c/z", "h3");

    let index = SimilarityIndex::calculate(&storage);

    let groups = index.groups_for("a");
    assert!(groups.len() >= 2);
    assert_eq!(groups[0].1.path(), "b");
    let percentages: Vec<f64> = groups
        .iter()
        .map(|(own, _)| own.duplicated_percentage())
        .collect();
    for window in percentages.windows(2) {
        assert!(window[0] >= window[1]);
    }
}

#[test]
fn file_pair_merge_is_a_partition() {
    let storage = MemoryStorage::new();
    add(&storage, "a/m1", "h1");
    add(&storage, "a/m2", "h2");
    add(&storage, "a/left", "h3");
    add(&storage, "b/m1", "h1");
    add(&storage, "b/m2", "h2");
    add(&storage, "b/right1", "h4");
    add(&storage, "b/right2", "h5");

    let f1 = storage.get_folder("a").unwrap();
    let f2 = storage.get_folder("b").unwrap();
    let (matched, only_left, only_right) = matched_file_pairs(&f1, &f2);

    assert_eq!(
        matched.len() * 2 + only_left.len() + only_right.len(),
        f1.files().len() + f2.files().len()
    );

    let mut seen = HashSet::new();
    for (l, r) in &matched {
        assert_eq!(l.fingerprint, r.fingerprint);
        assert!(seen.insert(l.path.clone()));
        assert!(seen.insert(r.path.clone()));
    }
    for f in only_left.iter().chain(only_right.iter()) {
        assert!(seen.insert(f.path.clone()));
    }

    // Ascending fingerprint order in all three lists.
    for window in matched.windows(2) {
        assert!(window[0].0.fingerprint <= window[1].0.fingerprint);
    }
}

#[test]
fn child_match_consumes_each_right_child_once() {
    let storage = MemoryStorage::new();
    add(&storage, "a/sub/y", "hy");
    add(&storage, "b/sub2/y", "hy");
    add(&storage, "a/solo/z", "hz");
    add(&storage, "b/extra/w", "hw");

    let index = SimilarityIndex::calculate(&storage);
    let a = storage.get_folder("a").unwrap();
    let b = storage.get_folder("b").unwrap();

    let (matched, left_only, right_only) = index.child_match(&a, &b);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].0.path(), "a/sub");
    assert_eq!(matched[0].1.path(), "b/sub2");
    assert_eq!(left_only.len(), 1);
    assert_eq!(left_only[0].path, "a/solo");
    assert_eq!(right_only.len(), 1);
    assert_eq!(right_only[0].path, "b/extra");
}

#[test]
fn merge_pair_reports_one_sided_subfolders() {
    // S4: ./a/x, ./a/sub/y, ./b/x with x duplicated across a and b.
    let storage = MemoryStorage::new();
    add(&storage, "a/x", "hx");
    add(&storage, "a/sub/y", "hy");
    add(&storage, "b/x", "hx");

    let index = SimilarityIndex::calculate(&storage);
    let (left, right) = index.pair("a", "b").unwrap();
    let mut merge = index.generate_merge_pair(&left, &right);

    assert_eq!(merge.match_kind(), MatchKind::BothSides);
    assert_eq!(merge.file_rows.len(), 1);
    assert!(merge.file_rows[0].left.is_some());
    assert!(merge.file_rows[0].right.is_some());

    assert_eq!(merge.folder_rows.len(), 1);
    let sub_row = &mut merge.folder_rows[0];
    assert_eq!(sub_row.match_kind(), MatchKind::OnlyLeft);
    match &sub_row.sides {
        MergeSides::OnlyLeft(folder) => assert_eq!(folder.path, "a/sub"),
        other => panic!("expected OnlyLeft, got {:?}", other.match_kind()),
    }

    // DeleteRight makes no sense on a left-only folder and is dropped.
    sub_row.set_action(MergeAction::DeleteRight);
    assert_eq!(sub_row.action, MergeAction::None);
    sub_row.set_action(MergeAction::MoveToRight);
    assert_eq!(sub_row.action, MergeAction::MoveToRight);
}

#[test]
fn matched_subfolder_rows_recurse() {
    let storage = MemoryStorage::new();
    add(&storage, "a/sub/y", "hy");
    add(&storage, "b/sub/y", "hy");
    add(&storage, "a/sub/only_left", "h1");

    let index = SimilarityIndex::calculate(&storage);
    let (left, right) = index.pair("a", "b").unwrap();
    let merge = index.generate_merge_pair(&left, &right);

    assert_eq!(merge.folder_rows.len(), 1);
    let sub = &merge.folder_rows[0];
    assert_eq!(sub.match_kind(), MatchKind::BothSides);
    assert_eq!(sub.file_rows.len(), 2);
    let one_sided = sub
        .file_rows
        .iter()
        .filter(|row| row.right.is_none())
        .count();
    assert_eq!(one_sided, 1);
}

#[test]
fn delete_similarity_group_erases_the_whole_chain() {
    let storage = MemoryStorage::new();
    add(&storage, "p/a/x", "hx");
    add(&storage, "q/b/x", "hx");
    add(&storage, "p/a/y", "hy");
    add(&storage, "q/b/y", "hy");

    let mut index = SimilarityIndex::calculate(&storage);
    let (left, right) = index.pair("p/a", "q/b").unwrap();
    index.delete_similarity_group(&left, &right).unwrap();

    assert!(index.pair("p/a", "q/b").is_err());
    assert!(index.pair("p", "q").is_err());
    assert!(index.pair("p/a", "q").is_err());
    assert!(!index.contains_group("p/a"));
    assert!(!index.contains_group("p"));
    assert!(index.groups_for("q").is_empty());
}

#[test]
fn delete_similarity_group_keeps_unrelated_pairs() {
    let storage = MemoryStorage::new();
    add(&storage, "p/a/x", "hx");
    add(&storage, "q/b/x", "hx");
    add(&storage, "r/c/z", "hz");
    add(&storage, "s/d/z", "hz");

    let mut index = SimilarityIndex::calculate(&storage);
    let (left, right) = index.pair("p/a", "q/b").unwrap();
    index.delete_similarity_group(&left, &right).unwrap();

    assert!(index.pair("r/c", "s/d").is_ok());
    assert!(index.contains_group("r"));
}

#[test]
fn missing_pair_is_a_not_found_error() {
    let storage = MemoryStorage::new();
    add(&storage, "a/x", "hx");
    add(&storage, "b/x", "hx");

    let index = SimilarityIndex::calculate(&storage);
    assert!(index.pair("a", "nowhere").is_err());
}

#[test]
fn similarity_is_rebuilt_from_current_storage() {
    let storage = MemoryStorage::new();
    add(&storage, "a/x", "hx");
    add(&storage, "b/x", "hx");

    let index = SimilarityIndex::calculate(&storage);
    assert!(index.contains_group("a"));

    let file = storage.get_folder("b").unwrap().file("x").unwrap();
    storage.remove_file(&file).unwrap();

    let index = SimilarityIndex::calculate(&storage);
    assert!(!index.contains_group("a"));
    assert!(index.similar_folders().is_empty());
}

fn arc_paths(folders: &[Arc<dupfold_core::storage::models::Folder>]) -> Vec<String> {
    folders.iter().map(|f| f.path.clone()).collect()
}

#[test]
fn folder_wrappers_expose_a_stable_parent_chain() {
    let storage = MemoryStorage::new();
    add(&storage, "a/sub/x", "h1");

    let sub = storage.get_folder("a/sub").unwrap();
    let chain: Vec<String> = std::iter::successors(Some(sub), |f| f.parent())
        .map(|f| f.path.clone())
        .collect();
    assert_eq!(chain, ["a/sub", "a", "."]);

    let a = storage.get_folder("a").unwrap();
    assert_eq!(arc_paths(&a.folders()), ["a/sub"]);
}
