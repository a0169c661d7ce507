//! Folder-pair similarity index.
//!
//! Turns the flat list of matched-file groups into per-pair statistics at
//! the direct-parent level, then propagates each pair's duplicate counts up
//! both ancestor chains so that enclosing folders report the overlap too.
//! The index is immutable between recomputations: build a new one with
//! [`SimilarityIndex::calculate`] and swap it in.

use ahash::AHashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::paths;
use crate::storage::models::{FileEntry, Folder};
use crate::storage::MemoryStorage;

/// Canonical key for an unordered folder pair.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

/// One folder's view of a similarity pair, as returned by queries.
#[derive(Debug, Clone)]
pub struct FolderSimilarity {
    pub folder: Arc<Folder>,
    /// Recursive file count at index-build time.
    pub file_count: usize,
    /// Distinct duplicated files this side contributes to the pair,
    /// including counts inherited from descendant pairs.
    pub duplicate_file_count: usize,
}

impl FolderSimilarity {
    pub fn path(&self) -> &str {
        &self.folder.path
    }

    pub fn duplicated_percentage(&self) -> f64 {
        self.duplicate_file_count as f64 * 100.0 / self.file_count as f64
    }
}

/// Internal per-side state: the query snapshot plus the basename-dedup map
/// used while accumulating direct-parent statistics.
struct PairSide {
    folder: Arc<Folder>,
    file_count: usize,
    duplicate_files: AHashMap<String, Arc<FileEntry>>,
    duplicate_file_count: usize,
}

impl PairSide {
    fn new(folder: Arc<Folder>) -> Self {
        let file_count = folder.file_count();
        Self {
            folder,
            file_count,
            duplicate_files: AHashMap::new(),
            duplicate_file_count: 0,
        }
    }

    fn snapshot(&self) -> FolderSimilarity {
        FolderSimilarity {
            folder: self.folder.clone(),
            file_count: self.file_count,
            duplicate_file_count: self.duplicate_file_count,
        }
    }
}

/// A stored pair; sides are kept in canonical (lexicographic path) order.
struct FolderPair {
    sides: [PairSide; 2],
}

impl FolderPair {
    fn new(a: Arc<Folder>, b: Arc<Folder>) -> Self {
        let (first, second) = if a.path <= b.path { (a, b) } else { (b, a) };
        Self {
            sides: [PairSide::new(first), PairSide::new(second)],
        }
    }

    fn side_index(&self, path: &str) -> usize {
        if self.sides[0].folder.path == path {
            0
        } else {
            1
        }
    }

    /// Sides reoriented so the first element is the one at `path`.
    fn oriented(&self, path: &str) -> (&PairSide, &PairSide) {
        if self.side_index(path) == 0 {
            (&self.sides[0], &self.sides[1])
        } else {
            (&self.sides[1], &self.sides[0])
        }
    }

    /// Record one duplicated file on the side at `path`, deduplicating by
    /// basename so a side counts distinct files rather than group
    /// multiplicity.
    fn record_duplicate(&mut self, path: &str, file: Arc<FileEntry>) {
        let side = &mut self.sides[self.side_index(path)];
        if !side.duplicate_files.contains_key(&file.name) {
            side.duplicate_files.insert(file.name.clone(), file);
            side.duplicate_file_count += 1;
        }
    }

    fn add_duplicate_count(&mut self, path: &str, count: usize) {
        let idx = self.side_index(path);
        self.sides[idx].duplicate_file_count += count;
    }

    fn sub_duplicate_count(&mut self, path: &str, count: usize) {
        let idx = self.side_index(path);
        self.sides[idx].duplicate_file_count =
            self.sides[idx].duplicate_file_count.saturating_sub(count);
    }
}

/// The two-level similarity index plus a reverse lookup from folder path to
/// the pair keys touching it.
pub struct SimilarityIndex {
    pairs: AHashMap<String, FolderPair>,
    by_folder: AHashMap<String, Vec<String>>,
}

impl SimilarityIndex {
    /// Build the index from storage's current matched groups. Call once per
    /// storage state; rebuilding replaces the whole index.
    pub fn calculate(storage: &MemoryStorage) -> Self {
        let mut pairs: AHashMap<String, FolderPair> = AHashMap::new();

        // Step A: direct-parent pairs from every cross-folder file pair in
        // every matched group. Same-folder duplicates are out of scope.
        for group in storage.matched_groups() {
            let files = &group.files;
            for i in 0..files.len() {
                for j in (i + 1)..files.len() {
                    let (p1, p2) = match (files[i].parent(), files[j].parent()) {
                        (Some(p1), Some(p2)) => (p1, p2),
                        _ => continue,
                    };
                    if p1.path == p2.path {
                        continue;
                    }

                    let key = pair_key(&p1.path, &p2.path);
                    let pair = pairs
                        .entry(key)
                        .or_insert_with(|| FolderPair::new(p1.clone(), p2.clone()));
                    pair.record_duplicate(&p1.path, files[i].clone());
                    pair.record_duplicate(&p2.path, files[j].clone());
                }
            }
        }

        // Step B: propagate each direct pair's counts to every ancestor
        // pair along both chains, excluding the common ancestor.
        let seeds: Vec<(Arc<Folder>, Arc<Folder>, usize, usize)> = pairs
            .values()
            .map(|p| {
                (
                    p.sides[0].folder.clone(),
                    p.sides[1].folder.clone(),
                    p.sides[0].duplicate_file_count,
                    p.sides[1].duplicate_file_count,
                )
            })
            .collect();
        for (fa, fb, ca, cb) in seeds {
            propagate_to_ancestors(&mut pairs, &fa, &fb, ca, cb);
        }

        let mut by_folder: AHashMap<String, Vec<String>> = AHashMap::new();
        for (key, pair) in &pairs {
            by_folder
                .entry(pair.sides[0].folder.path.clone())
                .or_default()
                .push(key.clone());
            by_folder
                .entry(pair.sides[1].folder.path.clone())
                .or_default()
                .push(key.clone());
        }

        Self { pairs, by_folder }
    }

    /// Whether `path` participates in at least one cross-folder pair.
    pub fn contains_group(&self, path: &str) -> bool {
        self.by_folder.contains_key(path)
    }

    /// Every folder path touching at least one pair, sorted.
    pub fn similar_folders(&self) -> Vec<String> {
        let mut out: Vec<String> = self.by_folder.keys().cloned().collect();
        out.sort();
        out
    }

    /// All pairs touching `path`, oriented so the first side is `path`.
    /// Sorted by own percentage, then the other side's percentage, then the
    /// number of distinct duplicated files on the queried side, all
    /// descending.
    pub fn groups_for(&self, path: &str) -> Vec<(FolderSimilarity, FolderSimilarity)> {
        let keys = match self.by_folder.get(path) {
            Some(keys) => keys,
            None => return Vec::new(),
        };

        let mut rows: Vec<(FolderSimilarity, FolderSimilarity, usize)> = keys
            .iter()
            .filter_map(|key| {
                let pair = self.pairs.get(key)?;
                let (own, other) = pair.oriented(path);
                Some((own.snapshot(), other.snapshot(), own.duplicate_files.len()))
            })
            .collect();

        rows.sort_by(|x, y| {
            y.0.duplicated_percentage()
                .total_cmp(&x.0.duplicated_percentage())
                .then_with(|| {
                    y.1.duplicated_percentage()
                        .total_cmp(&x.1.duplicated_percentage())
                })
                .then_with(|| y.2.cmp(&x.2))
        });

        rows.into_iter().map(|(own, other, _)| (own, other)).collect()
    }

    /// Oriented view of one specific pair.
    pub fn pair(
        &self,
        path_a: &str,
        path_b: &str,
    ) -> Result<(FolderSimilarity, FolderSimilarity), Error> {
        let pair = self
            .pairs
            .get(&pair_key(path_a, path_b))
            .ok_or(Error::PairNotFound)?;
        let (a, b) = pair.oriented(path_a);
        Ok((a.snapshot(), b.snapshot()))
    }

    /// Match `left`'s direct subfolders against `right`'s: a left child
    /// matches the first right child it shares a similarity pair with, and
    /// each right child is consumed at most once. Returns the matched
    /// oriented pairs and the leftovers on each side.
    pub fn child_match(
        &self,
        left: &Arc<Folder>,
        right: &Arc<Folder>,
    ) -> (
        Vec<(FolderSimilarity, FolderSimilarity)>,
        Vec<Arc<Folder>>,
        Vec<Arc<Folder>>,
    ) {
        let mut right_children: AHashMap<String, Arc<Folder>> = right
            .folders()
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect();

        let mut left_children = left.folders();
        left_children.sort_by(|a, b| a.name.cmp(&b.name));

        let mut matched = Vec::new();
        let mut left_only = Vec::new();

        for child in left_children {
            let mut found = false;
            for (own, other) in self.groups_for(&child.path) {
                if right_children.remove(other.path()).is_some() {
                    matched.push((own, other));
                    found = true;
                    break;
                }
            }
            if !found {
                left_only.push(child);
            }
        }

        let mut right_only: Vec<Arc<Folder>> = right_children.into_values().collect();
        right_only.sort_by(|a, b| a.name.cmp(&b.name));

        (matched, left_only, right_only)
    }

    /// Retire a pair after the user collapsed it: subtract its per-side
    /// counts from every pair along both ancestor chains (the pair itself
    /// included) and erase any pair whose side reaches zero, pruning the
    /// reverse index as well.
    pub fn delete_similarity_group(
        &mut self,
        left: &FolderSimilarity,
        right: &FolderSimilarity,
    ) -> Result<(), Error> {
        let original_key = pair_key(left.path(), right.path());
        let (count_left, count_right) = {
            let pair = self.pairs.get(&original_key).ok_or(Error::PairNotFound)?;
            let (own, other) = pair.oriented(left.path());
            (own.duplicate_file_count, other.duplicate_file_count)
        };

        let common = paths::common_ancestor(left.path(), right.path());
        let mut removed: Vec<(String, String, String)> = Vec::new();

        let mut cur_left = Some(left.folder.clone());
        while let Some(a) = cur_left {
            if a.path == common {
                break;
            }
            let mut cur_right = Some(right.folder.clone());
            while let Some(b) = cur_right {
                if b.path == common {
                    break;
                }

                let key = pair_key(&a.path, &b.path);
                let mut drained: Option<(String, String)> = None;
                if let Some(pair) = self.pairs.get_mut(&key) {
                    pair.sub_duplicate_count(&a.path, count_left);
                    pair.sub_duplicate_count(&b.path, count_right);

                    if pair.sides[0].duplicate_file_count == 0
                        || pair.sides[1].duplicate_file_count == 0
                    {
                        drained = Some((
                            pair.sides[0].folder.path.clone(),
                            pair.sides[1].folder.path.clone(),
                        ));
                    }
                }
                if let Some((pa, pb)) = drained {
                    self.pairs.remove(&key);
                    removed.push((key, pa, pb));
                }

                cur_right = b.parent();
            }
            cur_left = a.parent();
        }

        for (key, pa, pb) in removed {
            for path in [pa, pb] {
                let now_empty = match self.by_folder.get_mut(&path) {
                    Some(keys) => {
                        keys.retain(|k| k != &key);
                        keys.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    self.by_folder.remove(&path);
                }
            }
        }

        Ok(())
    }
}

/// Walk every ancestor pair `(a, b)` with `a` on `fa`'s chain and `b` on
/// `fb`'s chain (common ancestor excluded) and add the original pair's
/// per-side counts to both sides. The original pair itself is skipped; it
/// already carries them.
fn propagate_to_ancestors(
    pairs: &mut AHashMap<String, FolderPair>,
    fa: &Arc<Folder>,
    fb: &Arc<Folder>,
    count_a: usize,
    count_b: usize,
) {
    if fa.path == fb.path {
        return;
    }
    // Siblings: the chains contain only the original pair.
    if paths::parent_path(&fa.path) == paths::parent_path(&fb.path) {
        return;
    }

    let common = paths::common_ancestor(&fa.path, &fb.path);
    let original_key = pair_key(&fa.path, &fb.path);

    let mut cur_a = Some(fa.clone());
    while let Some(a) = cur_a {
        if a.path == common {
            break;
        }
        let mut cur_b = Some(fb.clone());
        while let Some(b) = cur_b {
            if b.path == common {
                break;
            }

            let key = pair_key(&a.path, &b.path);
            if key != original_key {
                let pair = pairs
                    .entry(key)
                    .or_insert_with(|| FolderPair::new(a.clone(), b.clone()));
                pair.add_duplicate_count(&a.path, count_a);
                pair.add_duplicate_count(&b.path, count_b);
            }

            cur_b = b.parent();
        }
        cur_a = a.parent();
    }
}

/// Reconcile the direct files of two folders by fingerprint: sort both
/// sides, then two-pointer merge into matched pairs and per-side leftovers.
/// All three outputs are in ascending fingerprint order.
pub fn matched_file_pairs(
    left: &Folder,
    right: &Folder,
) -> (
    Vec<(Arc<FileEntry>, Arc<FileEntry>)>,
    Vec<Arc<FileEntry>>,
    Vec<Arc<FileEntry>>,
) {
    let mut files_left = left.files();
    let mut files_right = right.files();
    files_left.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
    files_right.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

    let mut matched = Vec::new();
    let mut left_only = Vec::new();
    let mut right_only = Vec::new();

    let (mut a, mut b) = (0usize, 0usize);
    while a < files_left.len() || b < files_right.len() {
        if a >= files_left.len() {
            right_only.push(files_right[b].clone());
            b += 1;
        } else if b >= files_right.len() {
            left_only.push(files_left[a].clone());
            a += 1;
        } else if files_left[a].fingerprint == files_right[b].fingerprint {
            matched.push((files_left[a].clone(), files_right[b].clone()));
            a += 1;
            b += 1;
        } else if files_left[a].fingerprint < files_right[b].fingerprint {
            left_only.push(files_left[a].clone());
            a += 1;
        } else {
            right_only.push(files_right[b].clone());
            b += 1;
        }
    }

    (matched, left_only, right_only)
}
