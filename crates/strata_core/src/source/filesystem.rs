use std::collections::VecDeque;
use std::sync::Arc;

use strata_error::Result;
use tracing::{debug, trace};

use super::FragmentDiscovery;
use crate::arrays::scalar::ScalarValue;
use crate::expr::{self, Expression, col, eq, lit};
use crate::format::{FileFormat, FileSource, has_known_extension};
use crate::fragment::{DataFragment, DataFragmentIterator};
use crate::fs::{DirEntry, FileSystem};
use crate::scan::iter::LazyIterator;
use crate::scan::options::ScanOptions;

/// Discovery that walks a file system subtree for files of one format.
///
/// The walk is lazy: directories are listed one at a time as the fragment
/// iterator is advanced, and files are never opened. Files whose extension
/// the format doesn't claim are skipped.
///
/// A directory-listing failure is fatal to the walk: the error is reported
/// once and every later advancement reports exhaustion. Resuming past it
/// would silently drop the failed directory's subtree. Per-file errors are
/// different; those surface when the fragment is scanned and leave siblings
/// untouched.
#[derive(Debug)]
pub struct FileSystemDiscovery {
    fs: Arc<dyn FileSystem>,
    format: Arc<dyn FileFormat>,
    root: String,
    recursive: bool,
    infer_partitions: bool,
}

impl FileSystemDiscovery {
    pub fn new(fs: Arc<dyn FileSystem>, format: Arc<dyn FileFormat>, root: impl Into<String>) -> Self {
        let root = root.into();
        FileSystemDiscovery {
            fs,
            format,
            root: root.trim_end_matches('/').to_string(),
            recursive: false,
            infer_partitions: false,
        }
    }

    /// Descend into subdirectories instead of only listing the root.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Derive partition expressions from `key=value` directory names along
    /// each file's path, enabling per-file pruning.
    pub fn with_partition_inference(mut self, infer: bool) -> Self {
        self.infer_partitions = infer;
        self
    }
}

impl FragmentDiscovery for FileSystemDiscovery {
    fn discover(&self, options: Arc<ScanOptions>) -> DataFragmentIterator {
        Box::new(FileWalker {
            fs: self.fs.clone(),
            format: self.format.clone(),
            options,
            root: self.root.clone(),
            recursive: self.recursive,
            infer_partitions: self.infer_partitions,
            pending_dirs: [self.root.clone()].into(),
            pending: VecDeque::new(),
        })
    }
}

#[derive(Debug)]
struct FileWalker {
    fs: Arc<dyn FileSystem>,
    format: Arc<dyn FileFormat>,
    options: Arc<ScanOptions>,
    root: String,
    recursive: bool,
    infer_partitions: bool,
    pending_dirs: VecDeque<String>,
    pending: VecDeque<DirEntry>,
}

impl LazyIterator for FileWalker {
    type Item = Arc<dyn DataFragment>;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                if entry.is_directory() {
                    if self.recursive {
                        self.pending_dirs.push_back(entry.path);
                    }
                    continue;
                }

                if !has_known_extension(self.format.as_ref(), &entry.path) {
                    trace!(path = %entry.path, "skipping file with unclaimed extension");
                    continue;
                }

                let partition_expression = if self.infer_partitions {
                    infer_partition_expression(&self.root, &entry.path)
                } else {
                    None
                };

                let options = match &partition_expression {
                    Some(expression) => {
                        match self.options.clone().assume_partition_expression(expression) {
                            Some(options) => options,
                            None => {
                                debug!(path = %entry.path, %expression, "pruning file");
                                continue;
                            }
                        }
                    }
                    None => self.options.clone(),
                };

                let source = FileSource::path(self.fs.clone(), entry.path);
                let fragment = self.format.make_fragment(
                    self.format.clone(),
                    source,
                    options,
                    partition_expression,
                );
                return Ok(Some(fragment));
            }

            let Some(dir) = self.pending_dirs.pop_front() else {
                return Ok(None);
            };

            trace!(%dir, "listing directory");
            let entries = match self.fs.list_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    // A failed listing ends the walk. Continuing would
                    // silently drop the failed directory's subtree.
                    self.pending_dirs.clear();
                    self.pending.clear();
                    return Err(err);
                }
            };
            self.pending.extend(entries);
        }
    }
}

/// Build a partition expression from `key=value` directory components
/// between `root` and the file itself.
fn infer_partition_expression(root: &str, path: &str) -> Option<Expression> {
    let relative = path.strip_prefix(root)?.trim_start_matches('/');

    let mut components: Vec<&str> = relative.split('/').collect();
    // Last component is the file name.
    components.pop();

    let exprs = components.into_iter().filter_map(|component| {
        let (key, value) = component.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        Some(eq(col(key), lit(parse_partition_value(value))))
    });

    expr::and(exprs)
}

fn parse_partition_value(raw: &str) -> ScalarValue {
    if let Ok(v) = raw.parse::<i64>() {
        return ScalarValue::Int64(v);
    }
    if let Ok(v) = raw.parse::<bool>() {
        return ScalarValue::Boolean(v);
    }
    ScalarValue::Utf8(raw.to_string())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::fs::memory::MemoryFileSystem;
    use crate::scan::iter::{EmptyIterator, collect_all};
    use crate::scan::options::{DataSelector, Filter, ScanContext};
    use crate::scan::task::ScanTaskIterator;

    #[derive(Debug)]
    struct TextFormat;

    impl FileFormat for TextFormat {
        fn name(&self) -> &str {
            "text"
        }

        fn extensions(&self) -> &[&str] {
            &["txt"]
        }

        fn scan_file(
            &self,
            _source: &FileSource,
            _options: &Arc<ScanOptions>,
            _ctx: &ScanContext,
        ) -> Result<ScanTaskIterator> {
            Ok(Box::new(EmptyIterator::new()))
        }
    }

    fn fixture_fs() -> Arc<MemoryFileSystem> {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.create_file("root/1.txt", Bytes::from_static(b"1"));
        fs.create_file("root/notes.md", Bytes::from_static(b"n"));
        fs.create_file("root/sub/2.txt", Bytes::from_static(b"2"));
        fs.create_file("root/sub/deep/3.txt", Bytes::from_static(b"3"));
        fs
    }

    fn discovery(fs: Arc<MemoryFileSystem>) -> FileSystemDiscovery {
        FileSystemDiscovery::new(fs, Arc::new(TextFormat), "root")
    }

    fn partition_strings(fragments: &[Arc<dyn DataFragment>]) -> Vec<String> {
        fragments
            .iter()
            .map(|f| {
                f.as_ref()
                    .partition_expression()
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn non_recursive_lists_only_root() {
        let fs = fixture_fs();
        let iter = discovery(fs.clone()).discover(Arc::new(ScanOptions::default()));

        let fragments = collect_all(iter).unwrap();
        assert_eq!(1, fragments.len());
        assert_eq!(1, fs.list_count());
        assert_eq!(0, fs.open_count());
    }

    #[test]
    fn recursive_walks_subtree() {
        let fs = fixture_fs();
        let iter = discovery(fs.clone())
            .with_recursive(true)
            .discover(Arc::new(ScanOptions::default()));

        let fragments = collect_all(iter).unwrap();
        assert_eq!(3, fragments.len());
        assert_eq!(0, fs.open_count());
    }

    #[test]
    fn listing_is_lazy() {
        let fs = fixture_fs();
        let mut iter = discovery(fs.clone())
            .with_recursive(true)
            .discover(Arc::new(ScanOptions::default()));

        assert_eq!(0, fs.list_count());
        let _ = iter.next().unwrap().unwrap();
        assert_eq!(1, fs.list_count());
    }

    #[test]
    fn listing_failure_ends_the_walk() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.create_file("root/a/1.txt", Bytes::from_static(b"1"));
        fs.create_file("root/b/2.txt", Bytes::from_static(b"2"));
        fs.create_file("root/c/3.txt", Bytes::from_static(b"3"));

        let mut iter = discovery(fs.clone())
            .with_recursive(true)
            .discover(Arc::new(ScanOptions::default()));

        assert!(iter.next().unwrap().is_some());

        // Dropping b's only file makes listing "root/b" fail. The walk must
        // end there rather than resume with c's subtree.
        fs.delete_file("root/b/2.txt").unwrap();

        iter.next().unwrap_err();
        assert!(iter.next().unwrap().is_none());
        assert!(iter.next().unwrap().is_none());
    }

    #[test]
    fn format_controls_fragment_construction() {
        use crate::arrays::array::Array;
        use crate::arrays::batch::Batch;
        use crate::fragment::SimpleDataFragment;
        use crate::testutil::collect_task_batches;

        #[derive(Debug)]
        struct MarkerFormat;

        impl FileFormat for MarkerFormat {
            fn name(&self) -> &str {
                "marker"
            }

            fn extensions(&self) -> &[&str] {
                &["txt"]
            }

            fn scan_file(
                &self,
                _source: &FileSource,
                _options: &Arc<ScanOptions>,
                _ctx: &ScanContext,
            ) -> Result<ScanTaskIterator> {
                Ok(Box::new(EmptyIterator::new()))
            }

            fn make_fragment(
                &self,
                _format: Arc<dyn FileFormat>,
                _source: FileSource,
                _options: Arc<ScanOptions>,
                _partition_expression: Option<Expression>,
            ) -> Arc<dyn DataFragment> {
                let batch = Batch::try_new([Array::Int64(vec![Some(42)])]).unwrap();
                Arc::new(SimpleDataFragment::new([batch]))
            }
        }

        let fs = Arc::new(MemoryFileSystem::new());
        fs.create_file("root/1.txt", Bytes::from_static(b"x"));

        let iter = FileSystemDiscovery::new(fs, Arc::new(MarkerFormat), "root")
            .discover(Arc::new(ScanOptions::default()));
        let fragments = collect_all(iter).unwrap();
        assert_eq!(1, fragments.len());

        let tasks = fragments[0].scan(&ScanContext::default()).unwrap();
        let batches = collect_task_batches(tasks).unwrap();
        assert_eq!(
            vec![Batch::try_new([Array::Int64(vec![Some(42)])]).unwrap()],
            batches
        );
    }

    #[test]
    fn missing_root_errors_on_first_advance() {
        let fs = Arc::new(MemoryFileSystem::new());
        let mut iter = discovery(fs).discover(Arc::new(ScanOptions::default()));
        iter.next().unwrap_err();
        assert!(iter.next().unwrap().is_none());
    }

    #[test]
    fn hive_partitions_prune_without_io() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.create_file("root/alpha=3/f.txt", Bytes::from_static(b"3"));
        fs.create_file("root/alpha=5/g.txt", Bytes::from_static(b"5"));

        let options = Arc::new(ScanOptions {
            selector: Some(DataSelector::new([Filter::new(eq(col("alpha"), lit(3_i64)))])),
            ..Default::default()
        });

        let iter = FileSystemDiscovery::new(fs.clone(), Arc::new(TextFormat), "root")
            .with_recursive(true)
            .with_partition_inference(true)
            .discover(options);

        let fragments = collect_all(iter).unwrap();
        assert_eq!(vec!["alpha = 3".to_string()], partition_strings(&fragments));
        assert_eq!(0, fs.open_count());

        // The redundant filter is dropped from the fragment's options.
        let opts = fragments[0].scan_options().unwrap();
        assert!(opts.selector.as_ref().unwrap().is_select_all());
    }

    #[test]
    fn nested_partition_keys_conjoin() {
        let part = infer_partition_expression("root", "root/alpha=3/beta=x/f.txt").unwrap();
        assert_eq!("alpha = 3 AND beta = 'x'", part.to_string());
    }
}
