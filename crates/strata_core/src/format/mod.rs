use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use strata_error::Result;

use crate::expr::Expression;
use crate::fragment::DataFragment;
use crate::fs::{FileSystem, ReadableFile, path_extension};
use crate::scan::options::{ScanContext, ScanOptions};
use crate::scan::task::ScanTaskIterator;

/// Location of a single file's data.
///
/// Holding a source performs no I/O; opening it does.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A path on a file system, opened lazily.
    Path {
        fs: Arc<dyn FileSystem>,
        path: String,
    },
    /// An in-memory buffer standing in for a file.
    Buffer { path: String, data: Bytes },
}

impl FileSource {
    pub fn path(fs: Arc<dyn FileSystem>, path: impl Into<String>) -> Self {
        FileSource::Path {
            fs,
            path: path.into(),
        }
    }

    pub fn buffer(path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        FileSource::Buffer {
            path: path.into(),
            data: data.into(),
        }
    }

    pub fn path_str(&self) -> &str {
        match self {
            FileSource::Path { path, .. } => path,
            FileSource::Buffer { path, .. } => path,
        }
    }

    /// Open the source for reading.
    pub fn open(&self) -> Result<Box<dyn ReadableFile>> {
        match self {
            FileSource::Path { fs, path } => fs.open_read(path),
            FileSource::Buffer { path, data } => Ok(Box::new(BufferReadableFile {
                path: path.clone(),
                data: data.clone(),
            })),
        }
    }
}

#[derive(Debug)]
struct BufferReadableFile {
    path: String,
    data: Bytes,
}

impl ReadableFile for BufferReadableFile {
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

/// A file format that can be scanned as part of a dataset.
pub trait FileFormat: Debug + Sync + Send {
    /// Short name of the format, e.g. "ndjson".
    fn name(&self) -> &str;

    /// File extensions (without the dot) this format claims.
    fn extensions(&self) -> &[&str];

    /// Whether this format's fragments benefit from parallel tasks.
    fn splittable(&self) -> bool {
        false
    }

    /// Produce the scan tasks reading `source`.
    ///
    /// The source is opened on the first task advancement at the earliest,
    /// never during fragment construction.
    fn scan_file(
        &self,
        source: &FileSource,
        options: &Arc<ScanOptions>,
        ctx: &ScanContext,
    ) -> Result<ScanTaskIterator>;

    /// Build the fragment for one file of this format.
    ///
    /// `format` is the shared handle to this same format value. The default
    /// produces a [`FileFragment`]; formats needing a bespoke fragment type
    /// override this.
    fn make_fragment(
        &self,
        format: Arc<dyn FileFormat>,
        source: FileSource,
        options: Arc<ScanOptions>,
        partition_expression: Option<Expression>,
    ) -> Arc<dyn DataFragment> {
        Arc::new(FileFragment::new(
            source,
            format,
            options,
            partition_expression,
        ))
    }
}

/// Whether `path` carries one of `format`'s extensions.
pub fn has_known_extension(format: &dyn FileFormat, path: &str) -> bool {
    match path_extension(path) {
        Some(ext) => format
            .extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Fragment over a single file of some format.
#[derive(Debug)]
pub struct FileFragment {
    source: FileSource,
    format: Arc<dyn FileFormat>,
    options: Arc<ScanOptions>,
    partition_expression: Option<Expression>,
}

impl FileFragment {
    pub fn new(
        source: FileSource,
        format: Arc<dyn FileFormat>,
        options: Arc<ScanOptions>,
        partition_expression: Option<Expression>,
    ) -> Self {
        FileFragment {
            source,
            format,
            options,
            partition_expression,
        }
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }
}

impl DataFragment for FileFragment {
    fn scan(&self, ctx: &ScanContext) -> Result<ScanTaskIterator> {
        self.format.scan_file(&self.source, &self.options, ctx)
    }

    fn splittable(&self) -> bool {
        self.format.splittable()
    }

    fn scan_options(&self) -> Option<&Arc<ScanOptions>> {
        Some(&self.options)
    }

    fn partition_expression(&self) -> Option<&Expression> {
        self.partition_expression.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFileSystem;

    #[test]
    fn buffer_source_reads_without_fs() {
        let source = FileSource::buffer("inline", Bytes::from_static(b"data"));
        let mut file = source.open().unwrap();
        assert_eq!("inline", file.path());
        assert_eq!(Bytes::from_static(b"data"), file.read_to_end().unwrap());
    }

    #[test]
    fn path_source_opens_lazily() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.create_file("f.txt", Bytes::from_static(b"x"));

        let source = FileSource::path(fs.clone(), "f.txt");
        assert_eq!(0, fs.open_count());

        let _ = source.open().unwrap();
        assert_eq!(1, fs.open_count());
    }
}
