use serde::{Deserialize, Serialize};
use strata_error::{DbError, Result};

use super::datatype::DataType;

/// A named, typed column in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType, nullable: bool) -> Self {
        Field {
            name: name.into(),
            datatype,
            nullable,
        }
    }
}

/// Ordered sequence of fields describing the output of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn empty() -> Self {
        Schema { fields: Vec::new() }
    }

    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Schema {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check that no field name appears twice with conflicting types.
    ///
    /// A name appearing twice with the same type is accepted (sources may
    /// redundantly declare shared fields), conflicting types are a
    /// construction error.
    pub fn check_reconcilable(&self) -> Result<()> {
        for (idx, field) in self.fields.iter().enumerate() {
            for other in &self.fields[idx + 1..] {
                if field.name == other.name && field.datatype != other.datatype {
                    return Err(DbError::new(format!(
                        "Field '{}' declared with conflicting types {} and {}",
                        field.name, field.datatype, other.datatype,
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}
