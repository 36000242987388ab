use std::fmt::Debug;

use strata_error::Result;

use super::iter::{LazyIterator, VecIterator};
use crate::arrays::batch::Batch;

/// Iterator of scan tasks.
pub type ScanTaskIterator = Box<dyn LazyIterator<Item = Box<dyn ScanTask>>>;

/// Iterator of row batches.
pub type BatchIterator = Box<dyn LazyIterator<Item = Batch>>;

/// The leaf unit of scan work.
///
/// A task is bound to (part of) one fragment's data plus the resolved scan
/// options; executing it yields that data as a lazy sequence of batches, in
/// the physical order of the underlying source. Tasks hold no shared mutable
/// state, so independent tasks can be executed from different threads.
///
/// Scanning a freshly created task for unchanged source data is
/// deterministic.
pub trait ScanTask: Debug + Send {
    /// Execute the task, consuming it.
    fn scan(self: Box<Self>) -> Result<BatchIterator>;
}

/// A trivial task over an in-memory set of batches.
#[derive(Debug)]
pub struct SimpleScanTask {
    batches: Vec<Batch>,
}

impl SimpleScanTask {
    pub fn new(batches: impl IntoIterator<Item = Batch>) -> Self {
        SimpleScanTask {
            batches: batches.into_iter().collect(),
        }
    }
}

impl ScanTask for SimpleScanTask {
    fn scan(self: Box<Self>) -> Result<BatchIterator> {
        Ok(Box::new(VecIterator::new(self.batches)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;

    #[test]
    fn simple_task_yields_batches_in_order() {
        let b1 = Batch::try_new([Array::Int64(vec![Some(1)])]).unwrap();
        let b2 = Batch::try_new([Array::Int64(vec![Some(2)])]).unwrap();

        let task = Box::new(SimpleScanTask::new([b1.clone(), b2.clone()]));
        let mut batches = task.scan().unwrap();

        assert_eq!(Some(b1), batches.next().unwrap());
        assert_eq!(Some(b2), batches.next().unwrap());
        assert!(batches.next().unwrap().is_none());
        assert!(batches.next().unwrap().is_none());
    }
}
