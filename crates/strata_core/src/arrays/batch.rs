use strata_error::{DbError, Result};

use super::array::Array;
use super::datatype::DataType;
use super::scalar::ScalarValue;

/// A batch of same-length arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Columns that make up this batch.
    cols: Vec<Array>,
    /// Number of rows in this batch. Needed to allow for a batch that has no
    /// columns but a non-zero number of rows.
    num_rows: usize,
}

impl Batch {
    pub const fn empty() -> Self {
        Batch {
            cols: Vec::new(),
            num_rows: 0,
        }
    }

    /// Create a new batch from some number of arrays.
    ///
    /// All arrays must have the same length.
    pub fn try_new(cols: impl IntoIterator<Item = Array>) -> Result<Self> {
        let cols: Vec<_> = cols.into_iter().collect();
        let len = match cols.first() {
            Some(arr) => arr.len(),
            None => return Ok(Self::empty()),
        };

        for (idx, col) in cols.iter().enumerate() {
            if col.len() != len {
                return Err(DbError::new(format!(
                    "Expected column length to be {len}, got {}. Column idx: {idx}",
                    col.len()
                )));
            }
        }

        Ok(Batch {
            cols,
            num_rows: len,
        })
    }

    /// Build a batch from rows of scalars.
    ///
    /// Every row must have one scalar per datatype, in order.
    pub fn try_from_rows(
        datatypes: &[DataType],
        rows: impl IntoIterator<Item = Vec<ScalarValue>>,
    ) -> Result<Self> {
        let rows: Vec<_> = rows.into_iter().collect();
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != datatypes.len() {
                return Err(DbError::new(format!(
                    "Expected {} values in row {row_idx}, got {}",
                    datatypes.len(),
                    row.len()
                )));
            }
        }

        let num_rows = rows.len();
        let mut cols = Vec::with_capacity(datatypes.len());
        for (col_idx, datatype) in datatypes.iter().enumerate() {
            let scalars = rows.iter().map(|row| row[col_idx].clone());
            cols.push(Array::try_from_scalars(*datatype, scalars)?);
        }

        Ok(Batch { cols, num_rows })
    }

    /// Return a new batch containing only the columns at `indices`, in that
    /// order.
    pub fn project(&self, indices: &[usize]) -> Result<Self> {
        let cols = indices
            .iter()
            .map(|&idx| {
                self.cols.get(idx).cloned().ok_or_else(|| {
                    DbError::new(format!(
                        "Projection index {idx} out of bounds, batch has {} columns",
                        self.cols.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            cols,
            num_rows: self.num_rows,
        })
    }

    pub fn column(&self, idx: usize) -> Option<&Array> {
        self.cols.get(idx)
    }

    pub fn columns(&self) -> &[Array] {
        &self.cols
    }

    pub fn num_columns(&self) -> usize {
        self.cols.len()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }
}
