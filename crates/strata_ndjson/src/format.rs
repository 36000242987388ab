use std::sync::Arc;

use strata_core::arrays::batch::Batch;
use strata_core::arrays::datatype::DataType;
use strata_core::arrays::field::Schema;
use strata_core::format::{FileFormat, FileSource};
use strata_core::scan::iter::VecIterator;
use strata_core::scan::options::{ScanContext, ScanOptions};
use strata_core::scan::task::{BatchIterator, ScanTask, ScanTaskIterator};
use strata_error::{DbError, OptionExt, Result};
use tracing::trace;

use crate::reader::decode_lines;

/// Newline-delimited json file format.
///
/// Files are read whole and decoded against the scan schema; there's no
/// schema inference. Fragments are scanned as a single task.
#[derive(Debug, Default, Clone, Copy)]
pub struct NdJsonFileFormat;

impl FileFormat for NdJsonFileFormat {
    fn name(&self) -> &str {
        "ndjson"
    }

    fn extensions(&self) -> &[&str] {
        &["ndjson", "jsonl", "json"]
    }

    fn scan_file(
        &self,
        source: &FileSource,
        options: &Arc<ScanOptions>,
        ctx: &ScanContext,
    ) -> Result<ScanTaskIterator> {
        let schema = options
            .schema
            .clone()
            .required("Scanning ndjson requires a schema in the scan options")?;
        if ctx.batch_size == 0 {
            return Err(DbError::new("Batch size must be greater than zero"));
        }

        let task: Box<dyn ScanTask> = Box::new(NdJsonScanTask {
            source: source.clone(),
            schema,
            projection: options.projection.clone(),
            batch_size: ctx.batch_size,
        });
        Ok(Box::new(VecIterator::new([task])))
    }
}

/// Task reading one ndjson file.
///
/// The file is opened when the task executes, not before.
#[derive(Debug)]
struct NdJsonScanTask {
    source: FileSource,
    schema: Arc<Schema>,
    projection: Option<Vec<usize>>,
    batch_size: usize,
}

impl ScanTask for NdJsonScanTask {
    fn scan(self: Box<Self>) -> Result<BatchIterator> {
        let mut file = self.source.open()?;
        trace!(path = %file.path(), size = file.size(), "reading ndjson file");
        let data = file.read_to_end()?;

        let mut rows = decode_lines(&data, &self.schema)?;
        let datatypes: Vec<DataType> = self.schema.iter().map(|f| f.datatype).collect();

        let mut batches = Vec::new();
        while !rows.is_empty() {
            let tail = rows.split_off(self.batch_size.min(rows.len()));
            let mut batch = Batch::try_from_rows(&datatypes, rows)?;
            if let Some(projection) = &self.projection {
                batch = batch.project(projection)?;
            }
            batches.push(batch);
            rows = tail;
        }

        Ok(Box::new(VecIterator::new(batches)))
    }
}
