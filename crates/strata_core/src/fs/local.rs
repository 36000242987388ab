use std::fs;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use strata_error::{DbError, Result, ResultExt};

use super::{DirEntry, FileSystem, ReadableFile};

/// File system backed by the operating system's.
///
/// Accepts absolute or relative native paths; entries are reported with '/'
/// separators.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub const fn new() -> Self {
        LocalFileSystem
    }
}

fn path_to_string(path: &Path) -> Result<String> {
    match path.to_str() {
        Some(s) => Ok(s.replace('\\', "/")),
        None => Err(DbError::new(format!(
            "Path is not valid utf8: '{}'",
            path.display()
        ))),
    }
}

impl FileSystem for LocalFileSystem {
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let read_dir =
            fs::read_dir(path).context_fn(|| format!("Failed to list directory '{path}'"))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.context_fn(|| format!("Failed to list directory '{path}'"))?;
            let file_type = entry
                .file_type()
                .context_fn(|| format!("Failed to stat entry in '{path}'"))?;
            let entry_path = path_to_string(&entry.path())?;

            if file_type.is_dir() {
                entries.push(DirEntry::directory(entry_path));
            } else if file_type.is_file() {
                entries.push(DirEntry::file(entry_path));
            }
            // Symlinks and special files are skipped.
        }

        entries.sort();
        Ok(entries)
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn ReadableFile>> {
        let file = fs::File::open(path).context_fn(|| format!("Failed to open file '{path}'"))?;
        let len = file.metadata()?.len();

        Ok(Box::new(LocalReadableFile {
            path: path.to_string(),
            len,
            file,
        }))
    }
}

#[derive(Debug)]
struct LocalReadableFile {
    path: String,
    len: u64,
    file: fs::File,
}

impl ReadableFile for LocalReadableFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.len
    }

    fn read_to_end(&mut self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(self.len as usize);
        self.file
            .read_to_end(&mut buf)
            .context_fn(|| format!("Failed to read file '{}'", self.path))?;
        Ok(buf.into())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn list_and_read() {
        let dir = std::env::temp_dir().join(format!("strata-local-fs-{}", std::process::id()));
        fs::create_dir_all(dir.join("sub")).unwrap();
        let mut f = fs::File::create(dir.join("data.txt")).unwrap();
        f.write_all(b"hello").unwrap();
        drop(f);

        let fs_impl = LocalFileSystem::new();
        let root = path_to_string(&dir).unwrap();

        let entries = fs_impl.list_dir(&root).unwrap();
        assert_eq!(2, entries.len());
        assert!(entries.iter().any(|e| e.is_file() && e.file_name() == "data.txt"));
        assert!(entries.iter().any(|e| e.is_directory() && e.file_name() == "sub"));

        let mut file = fs_impl.open_read(&format!("{root}/data.txt")).unwrap();
        assert_eq!(5, file.size());
        assert_eq!(Bytes::from_static(b"hello"), file.read_to_end().unwrap());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_errors() {
        LocalFileSystem::new()
            .open_read("/definitely/does/not/exist.txt")
            .unwrap_err();
    }
}
