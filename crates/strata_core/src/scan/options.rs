use std::fmt;
use std::sync::Arc;

use crate::arrays::field::Schema;
use crate::expr::Expression;

pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Shared execution context for one scan.
///
/// Read-only for the duration of the scan; every fragment and task sees the
/// same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanContext {
    /// Target number of rows per produced batch.
    pub batch_size: usize,
}

impl Default for ScanContext {
    fn default() -> Self {
        ScanContext {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A single filtering condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub expression: Expression,
}

impl Filter {
    pub fn new(expression: Expression) -> Self {
        Filter { expression }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Conditions selecting which data a scan should include.
///
/// Semantically the conjunction of all filters. No filters selects
/// everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSelector {
    pub filters: Vec<Filter>,
}

impl DataSelector {
    pub fn new(filters: impl IntoIterator<Item = Filter>) -> Self {
        DataSelector {
            filters: filters.into_iter().collect(),
        }
    }

    pub fn is_select_all(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check if this selector can be satisfied given that
    /// `partition_expression` holds for all rows.
    ///
    /// Under-pruning is fine, over-pruning is a correctness bug: only return
    /// false on a provable (structural) contradiction.
    pub fn satisfiable_with(&self, partition_expression: &Expression) -> bool {
        !self
            .filters
            .iter()
            .any(|f| f.expression.contradicts(partition_expression))
    }

    /// Produce a selector with filters already implied by
    /// `partition_expression` removed.
    pub fn simplify_with(&self, partition_expression: &Expression) -> DataSelector {
        DataSelector {
            filters: self
                .filters
                .iter()
                .filter(|f| !f.expression.implied_by(partition_expression))
                .cloned()
                .collect(),
        }
    }
}

/// Configuration for a scan.
///
/// Shared read-only across all fragments of one scan. Never mutated once a
/// scan begins; simplification against a partition expression produces a new
/// value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanOptions {
    /// Schema to scan. Fragments must produce batches conforming to it.
    pub schema: Option<Arc<Schema>>,
    /// Which data to include. `None` selects everything.
    pub selector: Option<DataSelector>,
    /// Column indices into the schema to project to. `None` keeps all
    /// columns.
    pub projection: Option<Vec<usize>>,
}

impl ScanOptions {
    /// Specialize these options for data known to satisfy
    /// `partition_expression`.
    ///
    /// Returns `None` if the selector provably can't be satisfied, meaning
    /// the data can be pruned without reading it. Otherwise returns options
    /// with redundant filters dropped, sharing the original allocation when
    /// nothing changed.
    pub fn assume_partition_expression(
        self: Arc<Self>,
        partition_expression: &Expression,
    ) -> Option<Arc<ScanOptions>> {
        let Some(selector) = &self.selector else {
            return Some(self);
        };

        if !selector.satisfiable_with(partition_expression) {
            return None;
        }

        let simplified = selector.simplify_with(partition_expression);
        if &simplified == selector {
            return Some(self);
        }

        let mut options = (*self).clone();
        options.selector = Some(simplified);
        Some(Arc::new(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, eq, gt, lit};

    #[test]
    fn empty_selector_selects_all() {
        let selector = DataSelector::default();
        assert!(selector.is_select_all());
        assert!(selector.satisfiable_with(&eq(col("alpha"), lit(3_i64))));
    }

    #[test]
    fn contradicting_filter_unsatisfiable() {
        let selector = DataSelector::new([Filter::new(eq(col("alpha"), lit(0_i64)))]);
        assert!(!selector.satisfiable_with(&eq(col("alpha"), lit(3_i64))));
    }

    #[test]
    fn identical_filter_satisfiable_and_simplified_away() {
        let part = eq(col("alpha"), lit(3_i64));
        let selector = DataSelector::new([Filter::new(part.clone())]);
        assert!(selector.satisfiable_with(&part));

        let simplified = selector.simplify_with(&part);
        assert!(simplified.is_select_all());
    }

    #[test]
    fn assume_prunes_or_simplifies() {
        let part = eq(col("alpha"), lit(3_i64));

        let select_all = Arc::new(ScanOptions::default());
        assert!(select_all.assume_partition_expression(&part).is_some());

        let contradicting = Arc::new(ScanOptions {
            selector: Some(DataSelector::new([Filter::new(eq(col("alpha"), lit(0_i64)))])),
            ..Default::default()
        });
        assert!(contradicting.assume_partition_expression(&part).is_none());

        let redundant = Arc::new(ScanOptions {
            selector: Some(DataSelector::new([Filter::new(part.clone())])),
            ..Default::default()
        });
        let assumed = redundant.assume_partition_expression(&part).unwrap();
        assert!(assumed.selector.as_ref().unwrap().is_select_all());
    }

    #[test]
    fn unrelated_filter_kept() {
        let part = eq(col("alpha"), lit(3_i64));
        let selector = DataSelector::new([Filter::new(gt(col("beta"), lit(7_i64)))]);
        assert!(selector.satisfiable_with(&part));
        assert_eq!(selector, selector.simplify_with(&part));
    }
}
