//! Persisted index snapshots: a JSON array of file records that can
//! reconstitute storage without walking the filesystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Error;
use crate::storage::models::FileEntry;
use crate::storage::MemoryStorage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub fingerprint: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
}

/// Write every file currently in storage as a record array.
pub fn save<W: Write>(storage: &MemoryStorage, writer: W) -> Result<(), Error> {
    let records: Vec<FileRecord> = storage
        .root()?
        .walk_files()
        .into_iter()
        .map(|file| FileRecord {
            name: file.name.clone(),
            path: file.path.clone(),
            fingerprint: file.fingerprint.clone(),
            size: file.size,
            mod_time: file.modified,
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Load a record array into storage. Returns the number of files added.
pub fn load<R: Read>(reader: R, storage: &MemoryStorage) -> Result<usize, Error> {
    let records: Vec<FileRecord> = serde_json::from_reader(reader)?;
    let count = records.len();

    for record in records {
        storage.add_file(FileEntry::new(
            record.name,
            record.path,
            record.fingerprint,
            record.size,
            record.mod_time,
        ))?;
    }

    Ok(count)
}

pub fn save_path(storage: &MemoryStorage, path: &Path) -> Result<(), Error> {
    save(storage, BufWriter::new(File::create(path)?))
}

pub fn load_path(path: &Path, storage: &MemoryStorage) -> Result<usize, Error> {
    load(BufReader::new(File::open(path)?), storage)
}
