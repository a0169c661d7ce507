use chrono::Utc;
use std::sync::Arc;

use dupfold_core::storage::models::FileEntry;
use dupfold_core::MemoryStorage;

fn make_file(path: &str, fingerprint: &str) -> Arc<FileEntry> {
    let name = path.rsplit('/').next().unwrap_or(path);
    FileEntry::new(name, path, fingerprint, 100, Utc::now())
}

#[test]
fn add_creates_ancestor_chain() {
    let storage = MemoryStorage::new();
    storage.add_file(make_file("a/b/c/x.txt", "h1")).unwrap();

    let leaf = storage.get_folder("a/b/c").unwrap();
    assert_eq!(leaf.name, "c");
    assert_eq!(leaf.path, "a/b/c");

    let mid = leaf.parent().unwrap();
    assert_eq!(mid.path, "a/b");
    let top = mid.parent().unwrap();
    assert_eq!(top.path, "a");
    let root = top.parent().unwrap();
    assert_eq!(root.path, ".");
    assert!(root.parent().is_none());
}

#[test]
fn one_folder_object_per_path() {
    let storage = MemoryStorage::new();
    storage.add_file(make_file("a/x.txt", "h1")).unwrap();
    storage.add_file(make_file("a/y.txt", "h2")).unwrap();

    let first = storage.get_folder("a").unwrap();
    let second = storage.get_folder("a").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.direct_file_count(), 2);
}

#[test]
fn second_file_with_same_fingerprint_forms_a_group() {
    let storage = MemoryStorage::new();
    storage.add_file(make_file("a/x.txt", "h1")).unwrap();
    assert!(storage.matched_groups().is_empty());

    storage.add_file(make_file("b/x.txt", "h1")).unwrap();
    let groups = storage.matched_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].fingerprint, "h1");
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn all_files_with_one_fingerprint_share_one_group() {
    let storage = MemoryStorage::new();
    storage.add_file(make_file("a/x.txt", "h1")).unwrap();
    storage.add_file(make_file("b/x.txt", "h1")).unwrap();
    storage.add_file(make_file("c/x.txt", "h1")).unwrap();
    storage.add_file(make_file("d/other.txt", "h2")).unwrap();

    let groups = storage.matched_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 3);
    assert!(groups[0]
        .files
        .iter()
        .all(|f| f.fingerprint == groups[0].fingerprint));
}

#[test]
fn group_dissolves_when_it_shrinks_to_one() {
    let storage = MemoryStorage::new();
    let a = make_file("a/x.txt", "h1");
    let b = make_file("b/x.txt", "h1");
    storage.add_file(a.clone()).unwrap();
    storage.add_file(b).unwrap();

    storage.remove_file(&a).unwrap();
    assert!(storage.matched_groups().is_empty());

    // The survivor is still the fingerprint's representative: a new file
    // with the same fingerprint re-forms a group with it.
    storage.add_file(make_file("c/x.txt", "h1")).unwrap();
    let groups = storage.matched_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn net_empty_round_trip_leaves_nothing_behind() {
    let storage = MemoryStorage::new();
    let files = [
        make_file("a/x.txt", "h1"),
        make_file("b/x.txt", "h1"),
        make_file("a/sub/y.txt", "h2"),
        make_file("b/sub/y.txt", "h2"),
    ];
    for file in &files {
        storage.add_file(file.clone()).unwrap();
    }
    for file in &files {
        storage.remove_file(file).unwrap();
    }

    assert!(storage.matched_groups().is_empty());
    assert_eq!(storage.root().unwrap().file_count(), 0);
    assert_eq!(storage.get_folder("a").unwrap().file_count(), 0);
    assert_eq!(storage.get_folder("b/sub").unwrap().file_count(), 0);
}

#[test]
fn removing_an_absent_file_is_an_error() {
    let storage = MemoryStorage::new();
    let file = make_file("a/x.txt", "h1");
    storage.add_file(file.clone()).unwrap();
    storage.remove_file(&file).unwrap();

    assert!(storage.remove_file(&file).is_err());
}

#[test]
fn recursive_count_tracks_mutations() {
    let storage = MemoryStorage::new();
    storage.add_file(make_file("a/x.txt", "h1")).unwrap();
    storage.add_file(make_file("a/sub/y.txt", "h2")).unwrap();
    storage.add_file(make_file("a/sub/deep/z.txt", "h3")).unwrap();

    let a = storage.get_folder("a").unwrap();
    assert_eq!(a.file_count(), 3);
    assert_eq!(a.direct_file_count(), 1);
    assert_eq!(storage.root().unwrap().file_count(), 3);

    // Cache invalidation propagates up the chain on removal.
    let z = storage.get_folder("a/sub/deep").unwrap().file("z.txt").unwrap();
    storage.remove_file(&z).unwrap();
    assert_eq!(a.file_count(), 2);
    assert_eq!(storage.get_folder("a/sub").unwrap().file_count(), 1);
    assert_eq!(storage.root().unwrap().file_count(), 2);
}

#[test]
fn remove_folder_tree_detaches_records_and_nodes() {
    let storage = MemoryStorage::new();
    storage.add_file(make_file("a/x.txt", "h1")).unwrap();
    storage.add_file(make_file("a/sub/y.txt", "h1")).unwrap();
    storage.add_file(make_file("b/keep.txt", "h2")).unwrap();

    let a = storage.get_folder("a").unwrap();
    storage.remove_folder_tree(&a).unwrap();

    assert!(storage.matched_groups().is_empty());
    assert_eq!(storage.root().unwrap().file_count(), 1);
    assert!(storage.root().unwrap().folder("a").is_none());
}
