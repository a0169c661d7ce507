pub mod merge;
pub mod similarity;

pub use merge::{MatchKind, MergeAction, MergeFilePair, MergeFolderPair, MergeSides};
pub use similarity::{matched_file_pairs, pair_key, FolderSimilarity, SimilarityIndex};
