pub mod filesystem;

use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

use crate::expr::Expression;
use crate::fragment::{DataFragment, DataFragmentIterator};
use crate::scan::iter::{EmptyIterator, VecIterator};
use crate::scan::options::ScanOptions;

/// Strategy producing the fragments of one data source.
///
/// Implementations must be cheap to call repeatedly; the actual work happens
/// as the returned iterator is advanced. Errors hit while setting up
/// discovery are reported through the iterator, not eagerly.
pub trait FragmentDiscovery: Debug + Sync + Send {
    /// Yield fragments relevant to `options`, in a deterministic order for
    /// unchanged underlying data.
    fn discover(&self, options: Arc<ScanOptions>) -> DataFragmentIterator;
}

/// One source of fragments within a dataset.
///
/// A source may carry a partition expression, a predicate known to hold for
/// every row it contains. Fragment retrieval checks the scan's selector
/// against that expression first and skips discovery entirely when they
/// contradict. Pruning is conservative: a source is only skipped on a
/// provable contradiction, never on a merely unproven filter.
#[derive(Debug)]
pub struct DataSource {
    partition_expression: Option<Expression>,
    discovery: Box<dyn FragmentDiscovery>,
}

impl DataSource {
    pub fn new(discovery: Box<dyn FragmentDiscovery>) -> Self {
        DataSource {
            partition_expression: None,
            discovery,
        }
    }

    pub fn with_partition_expression(mut self, expression: Expression) -> Self {
        self.partition_expression = Some(expression);
        self
    }

    pub fn partition_expression(&self) -> Option<&Expression> {
        self.partition_expression.as_ref()
    }

    /// Retrieve this source's fragments for a scan.
    ///
    /// No discovery I/O happens until the returned iterator is advanced.
    pub fn get_fragments(&self, options: Arc<ScanOptions>) -> DataFragmentIterator {
        let options = match &self.partition_expression {
            Some(expression) => match options.assume_partition_expression(expression) {
                Some(options) => options,
                None => {
                    debug!(%expression, "pruning data source");
                    return Box::new(EmptyIterator::new());
                }
            },
            None => options,
        };

        self.discovery.discover(options)
    }
}

/// Discovery over a fixed set of fragments.
#[derive(Debug)]
pub struct VectorDiscovery {
    fragments: Vec<Arc<dyn DataFragment>>,
}

impl VectorDiscovery {
    pub fn new(fragments: impl IntoIterator<Item = Arc<dyn DataFragment>>) -> Self {
        VectorDiscovery {
            fragments: fragments.into_iter().collect(),
        }
    }
}

impl FragmentDiscovery for VectorDiscovery {
    fn discover(&self, _options: Arc<ScanOptions>) -> DataFragmentIterator {
        Box::new(VecIterator::new(self.fragments.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;
    use crate::arrays::batch::Batch;
    use crate::expr::{col, eq, lit};
    use crate::fragment::SimpleDataFragment;
    use crate::scan::iter::collect_all;
    use crate::scan::options::{DataSelector, Filter};

    fn one_fragment_source() -> DataSource {
        let batch = Batch::try_new([Array::Int64(vec![Some(1)])]).unwrap();
        let fragment: Arc<dyn DataFragment> = Arc::new(SimpleDataFragment::new([batch]));
        DataSource::new(Box::new(VectorDiscovery::new([fragment])))
    }

    #[test]
    fn no_partition_expression_yields_all() {
        let source = one_fragment_source();
        let fragments = collect_all(source.get_fragments(Arc::new(ScanOptions::default()))).unwrap();
        assert_eq!(1, fragments.len());
    }

    #[test]
    fn contradicting_selector_prunes_source() {
        let source = one_fragment_source().with_partition_expression(eq(col("alpha"), lit(3_i64)));

        let options = Arc::new(ScanOptions {
            selector: Some(DataSelector::new([Filter::new(eq(col("alpha"), lit(0_i64)))])),
            ..Default::default()
        });

        let fragments = collect_all(source.get_fragments(options)).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn matching_selector_keeps_source() {
        let source = one_fragment_source().with_partition_expression(eq(col("alpha"), lit(3_i64)));

        let options = Arc::new(ScanOptions {
            selector: Some(DataSelector::new([Filter::new(eq(col("alpha"), lit(3_i64)))])),
            ..Default::default()
        });

        let fragments = collect_all(source.get_fragments(options)).unwrap();
        assert_eq!(1, fragments.len());
    }
}
