use std::path::{Path, PathBuf};

use crate::storage::resolve;

/// A file inside the managed storage tree, resolved against a storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagedFile {
    path: PathBuf,
    relative: String,
}

impl ManagedFile {
    pub(crate) fn new(root: &Path, relative: &str) -> Self {
        ManagedFile {
            path: resolve(root, relative),
            relative: relative.to_string(),
        }
    }

    /// Returns the absolute path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path relative to the storage root, as recorded on the document.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Returns true if a regular file exists at the resolved path.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the entire content of the file into a byte vector.
    pub fn read_content(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}
