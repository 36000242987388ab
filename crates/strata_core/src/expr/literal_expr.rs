use std::fmt;

use crate::arrays::scalar::ScalarValue;

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub literal: ScalarValue,
}

impl fmt::Display for LiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            ScalarValue::Utf8(_) => {
                // Quote strings when printed as part of an expression.
                write!(f, "'{}'", self.literal)
            }
            other => write!(f, "{other}"),
        }
    }
}
