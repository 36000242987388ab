use std::fmt;

use crate::arrays::scalar::ScalarValue;

use super::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::NotEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub op: ComparisonOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl ComparisonExpr {
    /// If this comparison binds a single column to a literal with `=`, return
    /// the column name and the literal.
    ///
    /// Handles both `col = lit` and `lit = col`.
    pub fn as_column_equality(&self) -> Option<(&str, &ScalarValue)> {
        if self.op != ComparisonOperator::Eq {
            return None;
        }
        match (self.left.as_ref(), self.right.as_ref()) {
            (Expression::Column(col), Expression::Literal(lit)) => {
                Some((col.name.as_str(), &lit.literal))
            }
            (Expression::Literal(lit), Expression::Column(col)) => {
                Some((col.name.as_str(), &lit.literal))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}
