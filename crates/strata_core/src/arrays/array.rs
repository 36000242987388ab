use strata_error::{DbError, Result};

use super::datatype::DataType;
use super::scalar::ScalarValue;

/// A single column of values.
///
/// Nullability is represented directly with `Option` per value. Fine for a
/// scan layer that only needs to move batches around and compare them
/// structurally; a compute engine would want validity bitmaps instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// All-null column of some length.
    Null(usize),
    Boolean(Vec<Option<bool>>),
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

impl Array {
    pub fn datatype(&self) -> DataType {
        match self {
            Array::Null(_) => DataType::Null,
            Array::Boolean(_) => DataType::Boolean,
            Array::Int8(_) => DataType::Int8,
            Array::Int16(_) => DataType::Int16,
            Array::Int32(_) => DataType::Int32,
            Array::Int64(_) => DataType::Int64,
            Array::Float32(_) => DataType::Float32,
            Array::Float64(_) => DataType::Float64,
            Array::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Array::Null(len) => *len,
            Array::Boolean(v) => v.len(),
            Array::Int8(v) => v.len(),
            Array::Int16(v) => v.len(),
            Array::Int32(v) => v.len(),
            Array::Int64(v) => v.len(),
            Array::Float32(v) => v.len(),
            Array::Float64(v) => v.len(),
            Array::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at `idx`, `None` if out of bounds.
    pub fn value(&self, idx: usize) -> Option<ScalarValue> {
        if idx >= self.len() {
            return None;
        }

        fn get<T: Clone>(v: &[Option<T>], idx: usize, wrap: fn(T) -> ScalarValue) -> ScalarValue {
            match &v[idx] {
                Some(val) => wrap(val.clone()),
                None => ScalarValue::Null,
            }
        }

        Some(match self {
            Array::Null(_) => ScalarValue::Null,
            Array::Boolean(v) => get(v, idx, ScalarValue::Boolean),
            Array::Int8(v) => get(v, idx, ScalarValue::Int8),
            Array::Int16(v) => get(v, idx, ScalarValue::Int16),
            Array::Int32(v) => get(v, idx, ScalarValue::Int32),
            Array::Int64(v) => get(v, idx, ScalarValue::Int64),
            Array::Float32(v) => get(v, idx, ScalarValue::Float32),
            Array::Float64(v) => get(v, idx, ScalarValue::Float64),
            Array::Utf8(v) => get(v, idx, ScalarValue::Utf8),
        })
    }

    /// Build an array of the given type from scalar values.
    ///
    /// Null scalars become null entries. A scalar of the wrong type is an
    /// error.
    pub fn try_from_scalars(
        datatype: DataType,
        scalars: impl IntoIterator<Item = ScalarValue>,
    ) -> Result<Array> {
        fn collect<T>(
            scalars: impl IntoIterator<Item = ScalarValue>,
            datatype: DataType,
            unwrap: fn(ScalarValue) -> Option<T>,
        ) -> Result<Vec<Option<T>>> {
            scalars
                .into_iter()
                .map(|s| match s {
                    ScalarValue::Null => Ok(None),
                    other => match unwrap(other) {
                        Some(v) => Ok(Some(v)),
                        None => Err(DbError::new(format!(
                            "Unexpected scalar value for {datatype} array"
                        ))),
                    },
                })
                .collect()
        }

        Ok(match datatype {
            DataType::Null => Array::Null(scalars.into_iter().count()),
            DataType::Boolean => Array::Boolean(collect(scalars, datatype, |s| match s {
                ScalarValue::Boolean(v) => Some(v),
                _ => None,
            })?),
            DataType::Int8 => Array::Int8(collect(scalars, datatype, |s| match s {
                ScalarValue::Int8(v) => Some(v),
                _ => None,
            })?),
            DataType::Int16 => Array::Int16(collect(scalars, datatype, |s| match s {
                ScalarValue::Int16(v) => Some(v),
                _ => None,
            })?),
            DataType::Int32 => Array::Int32(collect(scalars, datatype, |s| match s {
                ScalarValue::Int32(v) => Some(v),
                _ => None,
            })?),
            DataType::Int64 => Array::Int64(collect(scalars, datatype, |s| match s {
                ScalarValue::Int64(v) => Some(v),
                _ => None,
            })?),
            DataType::Float32 => Array::Float32(collect(scalars, datatype, |s| match s {
                ScalarValue::Float32(v) => Some(v),
                _ => None,
            })?),
            DataType::Float64 => Array::Float64(collect(scalars, datatype, |s| match s {
                ScalarValue::Float64(v) => Some(v),
                _ => None,
            })?),
            DataType::Utf8 => Array::Utf8(collect(scalars, datatype, |s| match s {
                ScalarValue::Utf8(v) => Some(v),
                _ => None,
            })?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_scalars_with_nulls() {
        let arr = Array::try_from_scalars(
            DataType::Int64,
            [
                ScalarValue::Int64(4),
                ScalarValue::Null,
                ScalarValue::Int64(8),
            ],
        )
        .unwrap();

        assert_eq!(3, arr.len());
        assert_eq!(Some(ScalarValue::Null), arr.value(1));
        assert_eq!(Some(ScalarValue::Int64(8)), arr.value(2));
        assert_eq!(None, arr.value(3));
    }

    #[test]
    fn from_scalars_type_mismatch() {
        Array::try_from_scalars(DataType::Int64, [ScalarValue::Utf8("nope".to_string())])
            .unwrap_err();
    }
}
