use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::Error;

/// Filesystem capability bound to the scan root. Every task path resolves
/// through it, so relative paths cannot escape the root.
pub struct RootHandle {
    base: PathBuf,
}

impl RootHandle {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let base = path.as_ref().canonicalize()?;
        if !base.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", base.display()),
            )));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a root-relative path, rejecting absolute paths and any
    /// `..` component.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf, Error> {
        let rel_path = Path::new(rel);
        if rel_path.is_absolute() {
            return Err(escape_error(rel));
        }
        for component in rel_path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(escape_error(rel)),
            }
        }
        Ok(self.base.join(rel_path))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).map(|p| p.exists()).unwrap_or(false)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        fs::rename(self.resolve(from)?, self.resolve(to)?)?;
        Ok(())
    }

    pub fn remove_file(&self, rel: &str) -> Result<(), Error> {
        fs::remove_file(self.resolve(rel)?)?;
        Ok(())
    }

    pub fn remove_dir_all(&self, rel: &str) -> Result<(), Error> {
        fs::remove_dir_all(self.resolve(rel)?)?;
        Ok(())
    }
}

fn escape_error(rel: &str) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("path {} escapes the root", rel),
    ))
}

/// Delete a folder that is empty apart from hidden files.
///
/// A folder counts as empty when it contains only regular entries whose
/// basename starts with `.`; any subdirectory (hidden or not) or any
/// visible file makes it non-empty and yields the soft
/// [`Error::NotEmptyFolder`]. A folder that is already gone counts as
/// removed.
pub fn remove_empty_folder(root: &RootHandle, rel: &str) -> Result<(), Error> {
    let path = root.resolve(rel)?;
    let entries = match fs::read_dir(&path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            return Err(Error::NotEmptyFolder);
        }
        if !entry.file_name().to_string_lossy().starts_with('.') {
            return Err(Error::NotEmptyFolder);
        }
    }

    fs::remove_dir_all(&path)?;
    Ok(())
}
