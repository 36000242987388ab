//! Helpers for exercising datasets without a real file format.

use std::sync::Arc;

use strata_error::Result;

use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::field::{Field, Schema};
use crate::format::{FileFormat, FileSource};
use crate::scan::iter::{LazyIterator, VecIterator};
use crate::scan::options::{ScanContext, ScanOptions};
use crate::scan::task::{ScanTask, ScanTaskIterator, SimpleScanTask};

/// File format that ignores file contents and yields a fixed set of batches
/// for every file.
///
/// The source is still opened when tasks are created, so a missing or
/// deleted file fails at that fragment the same way a real format would.
#[derive(Debug)]
pub struct DummyFileFormat {
    batches: Vec<Batch>,
}

impl DummyFileFormat {
    pub fn new(batches: impl IntoIterator<Item = Batch>) -> Self {
        DummyFileFormat {
            batches: batches.into_iter().collect(),
        }
    }

    /// Format yielding one `(i64, utf8)` batch per file.
    pub fn standard() -> Self {
        Self::new([standard_batch()])
    }
}

impl FileFormat for DummyFileFormat {
    fn name(&self) -> &str {
        "dummy"
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn scan_file(
        &self,
        source: &FileSource,
        _options: &Arc<ScanOptions>,
        _ctx: &ScanContext,
    ) -> Result<ScanTaskIterator> {
        // Existence check. Contents are ignored.
        let _ = source.open()?;

        let task: Box<dyn ScanTask> = Box::new(SimpleScanTask::new(self.batches.clone()));
        Ok(Box::new(VecIterator::new([task])))
    }
}

/// Schema matching [`standard_batch`].
pub fn standard_schema() -> Schema {
    Schema::new([
        Field::new("i", DataType::Int64, true),
        Field::new("s", DataType::Utf8, true),
    ])
}

/// The batch yielded by [`DummyFileFormat::standard`].
pub fn standard_batch() -> Batch {
    int64_utf8_batch(&[(1, "one"), (2, "two"), (3, "three")])
}

pub fn int64_utf8_batch(rows: &[(i64, &str)]) -> Batch {
    let ints = rows.iter().map(|(i, _)| Some(*i)).collect();
    let strs = rows.iter().map(|(_, s)| Some(s.to_string())).collect();
    Batch::try_new([Array::Int64(ints), Array::Utf8(strs)]).expect("arrays have equal lengths")
}

/// Execute every task, collecting all batches in order.
pub fn collect_task_batches(mut tasks: ScanTaskIterator) -> Result<Vec<Batch>> {
    let mut batches = Vec::new();
    while let Some(task) = tasks.next()? {
        let mut task_batches = task.scan()?;
        while let Some(batch) = task_batches.next()? {
            batches.push(batch);
        }
    }
    Ok(batches)
}
