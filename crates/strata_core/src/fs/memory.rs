use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use strata_error::{DbError, Result};

use super::{DirEntry, FileSystem, ReadableFile, join_path};

/// In-memory file system.
///
/// Directories exist only implicitly through the files beneath them. Tracks
/// how many list and open calls were made, which tests use to assert that
/// discovery and pruning stay lazy.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<String, Bytes>>,
    list_calls: AtomicUsize,
    open_calls: AtomicUsize,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_file(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.files.lock().insert(path.into(), data.into());
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        match self.files.lock().remove(path) {
            Some(_) => Ok(()),
            None => Err(DbError::new(format!("File not found: '{path}'"))),
        }
    }

    /// Number of `list_dir` calls made so far.
    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Number of `open_read` calls made so far.
    pub fn open_count(&self) -> usize {
        self.open_calls.load(Ordering::Relaxed)
    }
}

impl FileSystem for MemoryFileSystem {
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        let normalized = path.trim_end_matches('/');
        let prefix = if normalized.is_empty() {
            String::new()
        } else {
            format!("{normalized}/")
        };

        let files = self.files.lock();
        let mut entries = BTreeSet::new();
        for file_path in files.keys() {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir_name, _)) => {
                    entries.insert(DirEntry::directory(join_path(normalized, dir_name)));
                }
                None => {
                    entries.insert(DirEntry::file(file_path.clone()));
                }
            }
        }

        // Directories exist only through the files beneath them, so an
        // empty listing means the directory does not exist. That includes
        // the root of an empty filesystem.
        if entries.is_empty() {
            return Err(DbError::new(format!("Directory not found: '{path}'")));
        }

        Ok(entries.into_iter().collect())
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn ReadableFile>> {
        self.open_calls.fetch_add(1, Ordering::Relaxed);

        let files = self.files.lock();
        match files.get(path) {
            Some(data) => Ok(Box::new(MemoryReadableFile {
                path: path.to_string(),
                data: data.clone(),
            })),
            None => Err(DbError::new(format!("File not found: '{path}'"))),
        }
    }
}

#[derive(Debug)]
struct MemoryReadableFile {
    path: String,
    data: Bytes,
}

impl ReadableFile for MemoryReadableFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_to_end(&mut self) -> Result<Bytes> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.create_file("root/a.txt", Bytes::from_static(b"aa"));
        fs.create_file("root/sub/b.txt", Bytes::from_static(b"bb"));
        fs.create_file("root/sub/deep/c.txt", Bytes::from_static(b"cc"));
        fs
    }

    #[test]
    fn list_direct_children_only() {
        let fs = fixture();
        let entries = fs.list_dir("root").unwrap();
        assert_eq!(
            vec![DirEntry::file("root/a.txt"), DirEntry::directory("root/sub")],
            entries
        );
    }

    #[test]
    fn list_missing_dir_errors() {
        let fs = fixture();
        fs.list_dir("root/nope").unwrap_err();
    }

    #[test]
    fn list_root_of_empty_filesystem_errors() {
        let fs = MemoryFileSystem::new();
        fs.list_dir("").unwrap_err();
        fs.list_dir("/").unwrap_err();
    }

    #[test]
    fn read_and_delete() {
        let fs = fixture();
        let mut file = fs.open_read("root/a.txt").unwrap();
        assert_eq!(Bytes::from_static(b"aa"), file.read_to_end().unwrap());

        fs.delete_file("root/a.txt").unwrap();
        fs.open_read("root/a.txt").unwrap_err();
    }

    #[test]
    fn call_counters() {
        let fs = fixture();
        assert_eq!(0, fs.list_count());
        assert_eq!(0, fs.open_count());

        let _ = fs.list_dir("root").unwrap();
        let _ = fs.open_read("root/a.txt").unwrap();
        let _ = fs.open_read("root/a.txt").unwrap();

        assert_eq!(1, fs.list_count());
        assert_eq!(2, fs.open_count());
    }
}
