pub mod memory;
pub mod models;

pub use memory::MemoryStorage;
pub use models::{FileEntry, Folder, MatchedFileGroup};
