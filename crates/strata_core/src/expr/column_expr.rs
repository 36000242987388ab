use std::fmt;

/// Reference to a named column.
///
/// Partition expressions are built before any binding to a concrete schema
/// happens, so columns are referenced by name rather than index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    pub name: String,
}

impl ColumnExpr {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnExpr { name: name.into() }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
