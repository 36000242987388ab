use serde_json::Value;
use strata_core::arrays::datatype::DataType;
use strata_core::arrays::field::Schema;
use strata_core::arrays::scalar::ScalarValue;
use strata_error::{DbError, Result, ResultExt};

/// Decode newline-delimited json into rows of scalars matching `schema`.
///
/// Each non-empty line must be a json object. Fields missing from a line
/// decode as null; object keys not in the schema are ignored. Errors name
/// the offending line (1-based).
pub fn decode_lines(data: &[u8], schema: &Schema) -> Result<Vec<Vec<ScalarValue>>> {
    let text = std::str::from_utf8(data)?;

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let line_no = idx + 1;
        let value: Value = serde_json::from_str(line)
            .context_fn(|| format!("Failed to parse json on line {line_no}"))?;
        let Value::Object(object) = value else {
            return Err(DbError::new(format!(
                "Expected a json object on line {line_no}, got: {value}"
            )));
        };

        let mut row = Vec::with_capacity(schema.num_fields());
        for field in schema.iter() {
            let scalar = match object.get(&field.name) {
                Some(value) => scalar_from_json(value, field.datatype).map_err(|e| {
                    DbError::new(format!(
                        "Failed to decode field '{}' on line {line_no}: {e}",
                        field.name
                    ))
                })?,
                None => ScalarValue::Null,
            };

            if scalar.is_null() && !field.nullable {
                return Err(DbError::new(format!(
                    "Missing value for non-nullable field '{}' on line {line_no}",
                    field.name
                )));
            }

            row.push(scalar);
        }
        rows.push(row);
    }

    Ok(rows)
}

fn scalar_from_json(value: &Value, datatype: DataType) -> Result<ScalarValue> {
    if value.is_null() {
        return Ok(ScalarValue::Null);
    }

    let mismatch =
        || DbError::new(format!("Cannot decode json value {value} as {datatype}"));

    Ok(match datatype {
        DataType::Null => ScalarValue::Null,
        DataType::Boolean => ScalarValue::Boolean(value.as_bool().ok_or_else(mismatch)?),
        DataType::Int8 => {
            let v = value.as_i64().ok_or_else(mismatch)?;
            ScalarValue::Int8(v.try_into().map_err(|_| mismatch())?)
        }
        DataType::Int16 => {
            let v = value.as_i64().ok_or_else(mismatch)?;
            ScalarValue::Int16(v.try_into().map_err(|_| mismatch())?)
        }
        DataType::Int32 => {
            let v = value.as_i64().ok_or_else(mismatch)?;
            ScalarValue::Int32(v.try_into().map_err(|_| mismatch())?)
        }
        DataType::Int64 => ScalarValue::Int64(value.as_i64().ok_or_else(mismatch)?),
        DataType::Float32 => ScalarValue::Float32(value.as_f64().ok_or_else(mismatch)? as f32),
        DataType::Float64 => ScalarValue::Float64(value.as_f64().ok_or_else(mismatch)?),
        DataType::Utf8 => ScalarValue::Utf8(value.as_str().ok_or_else(mismatch)?.to_string()),
    })
}
