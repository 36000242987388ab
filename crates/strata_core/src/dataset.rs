use std::sync::Arc;
use std::vec;

use strata_error::{DbError, Result};
use tracing::debug;

use crate::arrays::batch::Batch;
use crate::arrays::field::Schema;
use crate::expr::Expression;
use crate::fragment::{DataFragment, DataFragmentIterator};
use crate::scan::iter::LazyIterator;
use crate::scan::options::{DataSelector, Filter, ScanContext, ScanOptions};
use crate::scan::task::{ScanTask, ScanTaskIterator};
use crate::source::DataSource;

/// A logical collection of data made up of one or more sources.
///
/// Construction validates shape only; no source is listed or opened until a
/// scan is advanced.
#[derive(Debug)]
pub struct Dataset {
    schema: Arc<Schema>,
    sources: Vec<Arc<DataSource>>,
}

impl Dataset {
    pub fn try_new(
        schema: Schema,
        sources: impl IntoIterator<Item = Arc<DataSource>>,
    ) -> Result<Arc<Self>> {
        let sources: Vec<_> = sources.into_iter().collect();
        if sources.is_empty() {
            return Err(DbError::new("Dataset requires at least one data source"));
        }
        schema.check_reconcilable()?;

        Ok(Arc::new(Dataset {
            schema: Arc::new(schema),
            sources,
        }))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn sources(&self) -> &[Arc<DataSource>] {
        &self.sources
    }

    /// Begin configuring a scan of this dataset.
    pub fn scan(&self) -> ScannerBuilder {
        ScannerBuilder::new(self)
    }
}

/// Builder for a [`Scanner`].
#[derive(Debug)]
pub struct ScannerBuilder {
    schema: Arc<Schema>,
    sources: Vec<Arc<DataSource>>,
    filters: Vec<Filter>,
    projection: Option<Vec<usize>>,
    ctx: ScanContext,
}

impl ScannerBuilder {
    pub fn new(dataset: &Dataset) -> Self {
        ScannerBuilder {
            schema: dataset.schema.clone(),
            sources: dataset.sources.clone(),
            filters: Vec::new(),
            projection: None,
            ctx: ScanContext::default(),
        }
    }

    /// Add a filter; all filters must hold for a row to be included.
    pub fn filter(mut self, expression: Expression) -> Self {
        self.filters.push(Filter::new(expression));
        self
    }

    /// Project the scan to a subset of schema columns, by index.
    pub fn project(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.projection = Some(indices.into_iter().collect());
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.ctx.batch_size = batch_size;
        self
    }

    pub fn finish(self) -> Result<Scanner> {
        if let Some(projection) = &self.projection {
            for &idx in projection {
                if idx >= self.schema.num_fields() {
                    return Err(DbError::new(format!(
                        "Projection index {idx} out of bounds, schema has {} fields",
                        self.schema.num_fields(),
                    )));
                }
            }
        }
        if self.ctx.batch_size == 0 {
            return Err(DbError::new("Batch size must be greater than zero"));
        }

        let selector = if self.filters.is_empty() {
            None
        } else {
            Some(DataSelector::new(self.filters))
        };

        let options = Arc::new(ScanOptions {
            schema: Some(self.schema),
            selector,
            projection: self.projection,
        });

        Ok(Scanner {
            sources: self.sources,
            options,
            ctx: self.ctx,
        })
    }
}

/// A configured scan over a dataset.
///
/// Cheap to construct; all work happens as the returned iterators are
/// advanced. A fragment failing to set up its tasks surfaces as an error on
/// that advancement, and continuing past it resumes with the remaining
/// fragments.
#[derive(Debug)]
pub struct Scanner {
    sources: Vec<Arc<DataSource>>,
    options: Arc<ScanOptions>,
    ctx: ScanContext,
}

impl Scanner {
    pub fn options(&self) -> &Arc<ScanOptions> {
        &self.options
    }

    /// Iterate the fragments of every source, in source order.
    ///
    /// Sources pruned by their partition expression contribute nothing.
    pub fn fragments(&self) -> DataFragmentIterator {
        debug!(num_sources = self.sources.len(), "scanning dataset");
        Box::new(SourceFragments {
            sources: self.sources.clone().into_iter(),
            options: self.options.clone(),
            current: None,
        })
    }

    /// Iterate the scan tasks of every fragment.
    pub fn scan(&self) -> ScanTaskIterator {
        Box::new(FragmentTasks {
            fragments: self.fragments(),
            ctx: self.ctx,
            current: None,
        })
    }

    /// Execute the whole scan, collecting every batch.
    pub fn to_batches(&self) -> Result<Vec<Batch>> {
        let mut tasks = self.scan();
        let mut batches = Vec::new();
        while let Some(task) = tasks.next()? {
            let mut task_batches = task.scan()?;
            while let Some(batch) = task_batches.next()? {
                batches.push(batch);
            }
        }
        Ok(batches)
    }
}

#[derive(Debug)]
struct SourceFragments {
    sources: vec::IntoIter<Arc<DataSource>>,
    options: Arc<ScanOptions>,
    current: Option<DataFragmentIterator>,
}

impl LazyIterator for SourceFragments {
    type Item = Arc<dyn DataFragment>;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        loop {
            if let Some(fragments) = &mut self.current {
                // Errors propagate but leave the iterator in place, so the
                // caller can keep pulling the remaining fragments.
                match fragments.next()? {
                    Some(fragment) => return Ok(Some(fragment)),
                    None => self.current = None,
                }
                continue;
            }

            match self.sources.next() {
                Some(source) => self.current = Some(source.get_fragments(self.options.clone())),
                None => return Ok(None),
            }
        }
    }
}

#[derive(Debug)]
struct FragmentTasks {
    fragments: DataFragmentIterator,
    ctx: ScanContext,
    current: Option<ScanTaskIterator>,
}

impl LazyIterator for FragmentTasks {
    type Item = Box<dyn ScanTask>;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        loop {
            if let Some(tasks) = &mut self.current {
                match tasks.next()? {
                    Some(task) => return Ok(Some(task)),
                    None => self.current = None,
                }
                continue;
            }

            match self.fragments.next()? {
                // A failure here is scoped to this fragment; the fragment
                // iterator is still intact for the next call.
                Some(fragment) => self.current = Some(fragment.scan(&self.ctx)?),
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::Array;
    use crate::arrays::datatype::DataType;
    use crate::arrays::field::Field;
    use crate::expr::{col, eq, lit};
    use crate::fragment::SimpleDataFragment;
    use crate::source::VectorDiscovery;

    fn int_schema() -> Schema {
        Schema::new([Field::new("v", DataType::Int64, true)])
    }

    fn source_with(values: &[i64]) -> Arc<DataSource> {
        let batch = Batch::try_new([Array::Int64(values.iter().copied().map(Some).collect())])
            .unwrap();
        let fragment: Arc<dyn DataFragment> = Arc::new(SimpleDataFragment::new([batch]));
        Arc::new(DataSource::new(Box::new(VectorDiscovery::new([fragment]))))
    }

    #[test]
    fn requires_at_least_one_source() {
        Dataset::try_new(int_schema(), []).unwrap_err();
    }

    #[test]
    fn rejects_unreconcilable_schema() {
        let schema = Schema::new([
            Field::new("v", DataType::Int64, true),
            Field::new("v", DataType::Utf8, true),
        ]);
        Dataset::try_new(schema, [source_with(&[1])]).unwrap_err();
    }

    #[test]
    fn rejects_out_of_bounds_projection() {
        let dataset = Dataset::try_new(int_schema(), [source_with(&[1])]).unwrap();
        dataset.scan().project([1]).finish().unwrap_err();
    }

    #[test]
    fn scans_sources_in_order() {
        let dataset =
            Dataset::try_new(int_schema(), [source_with(&[1, 2]), source_with(&[3])]).unwrap();

        let scanner = dataset.scan().finish().unwrap();
        let batches = scanner.to_batches().unwrap();

        assert_eq!(2, batches.len());
        assert_eq!(Array::Int64(vec![Some(1), Some(2)]), *batches[0].column(0).unwrap());
        assert_eq!(Array::Int64(vec![Some(3)]), *batches[1].column(0).unwrap());
    }

    #[test]
    fn pruned_source_skipped_entirely() {
        let pruned = Arc::new(
            DataSource::new(Box::new(VectorDiscovery::new([Arc::new(
                SimpleDataFragment::new([Batch::try_new([Array::Int64(vec![Some(9)])]).unwrap()]),
            ) as Arc<dyn DataFragment>])))
            .with_partition_expression(eq(col("v"), lit(0_i64))),
        );

        let dataset = Dataset::try_new(int_schema(), [source_with(&[1]), pruned]).unwrap();
        let scanner = dataset
            .scan()
            .filter(eq(col("v"), lit(1_i64)))
            .finish()
            .unwrap();

        let batches = scanner.to_batches().unwrap();
        assert_eq!(1, batches.len());
        assert_eq!(Array::Int64(vec![Some(1)]), *batches[0].column(0).unwrap());
    }

    #[derive(Debug)]
    struct FailingFragment;

    impl DataFragment for FailingFragment {
        fn scan(&self, _ctx: &ScanContext) -> Result<ScanTaskIterator> {
            Err(DbError::new("fragment unavailable"))
        }

        fn scan_options(&self) -> Option<&Arc<ScanOptions>> {
            None
        }
    }

    #[test]
    fn fragment_error_does_not_poison_scan() {
        let batch = Batch::try_new([Array::Int64(vec![Some(7)])]).unwrap();
        let fragments: Vec<Arc<dyn DataFragment>> = vec![
            Arc::new(FailingFragment),
            Arc::new(SimpleDataFragment::new([batch.clone()])),
        ];
        let source = Arc::new(DataSource::new(Box::new(VectorDiscovery::new(fragments))));

        let dataset = Dataset::try_new(int_schema(), [source]).unwrap();
        let mut tasks = dataset.scan().finish().unwrap().scan();

        tasks.next().unwrap_err();

        let task = tasks.next().unwrap().unwrap();
        let mut batches = task.scan().unwrap();
        assert_eq!(Some(batch), batches.next().unwrap());
        assert!(tasks.next().unwrap().is_none());
    }
}
