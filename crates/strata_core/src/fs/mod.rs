pub mod local;
pub mod memory;

use std::fmt::Debug;

use bytes::Bytes;
use strata_error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryType {
    File,
    Directory,
}

/// Entry returned from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub path: String,
    pub entry_type: EntryType,
}

impl DirEntry {
    pub fn file(path: impl Into<String>) -> Self {
        DirEntry {
            path: path.into(),
            entry_type: EntryType::File,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        DirEntry {
            path: path.into(),
            entry_type: EntryType::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Final component of the entry's path.
    pub fn file_name(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.path,
        }
    }
}

/// Read access to a hierarchical set of files.
///
/// Paths use '/' separators regardless of platform. Listing and opening are
/// the only operations discovery needs; both report missing paths as errors
/// rather than empty results so that concurrent deletions surface to the
/// caller.
pub trait FileSystem: Debug + Sync + Send {
    /// List the entries directly under `path`, sorted by path.
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Open a file for reading.
    fn open_read(&self, path: &str) -> Result<Box<dyn ReadableFile>>;
}

/// An opened file.
pub trait ReadableFile: Debug + Send {
    fn path(&self) -> &str;

    fn size(&self) -> u64;

    /// Read the complete contents of the file.
    fn read_to_end(&mut self) -> Result<Bytes>;
}

/// Join a directory path and a child name.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Extension of the final path component, without the leading dot.
pub fn path_extension(path: &str) -> Option<&str> {
    let name = match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    };
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}
