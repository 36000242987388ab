use std::fmt::Debug;
use std::sync::Arc;

use strata_error::Result;

use crate::arrays::batch::Batch;
use crate::expr::Expression;
use crate::scan::iter::{LazyIterator, VecIterator};
use crate::scan::options::{ScanContext, ScanOptions};
use crate::scan::task::{ScanTask, ScanTaskIterator, SimpleScanTask};

/// Iterator of data fragments.
pub type DataFragmentIterator = Box<dyn LazyIterator<Item = Arc<dyn DataFragment>>>;

/// A granular piece of a dataset, such as an individual file, which can be
/// scanned separately from other fragments.
///
/// A fragment yields batches through one or more scan tasks. Fragments do
/// not own their source data; they hold a location resolved lazily when a
/// task is executed, and no I/O happens until then.
pub trait DataFragment: Debug + Sync + Send {
    /// Return the scan tasks that together yield this fragment's batches.
    ///
    /// Task order matches the physical order of the data.
    fn scan(&self, ctx: &ScanContext) -> Result<ScanTaskIterator>;

    /// Return true if the fragment can benefit from being scanned as
    /// multiple parallel tasks.
    fn splittable(&self) -> bool {
        false
    }

    /// Filtering and schema options to use when scanning this fragment.
    ///
    /// `None` means no filtering or schema reconciliation will be performed.
    fn scan_options(&self) -> Option<&Arc<ScanOptions>>;

    /// A predicate known to hold for every row in this fragment, if any.
    fn partition_expression(&self) -> Option<&Expression> {
        None
    }
}

/// A trivial fragment yielding a fixed set of in-memory batches through a
/// single task.
#[derive(Debug)]
pub struct SimpleDataFragment {
    batches: Vec<Batch>,
}

impl SimpleDataFragment {
    pub fn new(batches: impl IntoIterator<Item = Batch>) -> Self {
        SimpleDataFragment {
            batches: batches.into_iter().collect(),
        }
    }
}

impl DataFragment for SimpleDataFragment {
    fn scan(&self, _ctx: &ScanContext) -> Result<ScanTaskIterator> {
        let task: Box<dyn ScanTask> = Box::new(SimpleScanTask::new(self.batches.clone()));
        Ok(Box::new(VecIterator::new([task])))
    }

    fn scan_options(&self) -> Option<&Arc<ScanOptions>> {
        None
    }
}
