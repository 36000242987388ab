pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod literal_expr;

use std::fmt;

use column_expr::ColumnExpr;
use comparison_expr::{ComparisonExpr, ComparisonOperator};
use conjunction_expr::{ConjunctionExpr, ConjunctionOperator};
use literal_expr::LiteralExpr;

use crate::arrays::scalar::ScalarValue;

/// An immutable predicate tree over column references and literals.
///
/// The scan layer never evaluates expressions against row data; it only
/// needs structural copies (`Clone`), structural equality (`PartialEq`), and
/// the contradiction check below for partition pruning.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnExpr),
    Literal(LiteralExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
}

impl Expression {
    /// Flatten this expression into its AND conjuncts.
    ///
    /// A non-conjunction expression is its own single conjunct. OR
    /// conjunctions are opaque; they count as a single conjunct and never
    /// participate in pruning.
    pub fn conjuncts(&self) -> Vec<&Expression> {
        match self {
            Expression::Conjunction(conj) if conj.op == ConjunctionOperator::And => conj
                .expressions
                .iter()
                .flat_map(|e| e.conjuncts())
                .collect(),
            other => vec![other],
        }
    }

    /// Check if this expression provably contradicts `other`.
    ///
    /// Comparison is structural only: two `=` predicates binding the same
    /// column to unequal literals contradict. Anything else, including
    /// semantically contradictory range predicates, is treated as not
    /// contradicting. Downstream code relies on this exact (weak) pruning
    /// boundary; do not make this smarter without auditing callers.
    pub fn contradicts(&self, other: &Expression) -> bool {
        for left in self.conjuncts() {
            for right in other.conjuncts() {
                let (Expression::Comparison(l), Expression::Comparison(r)) = (left, right) else {
                    continue;
                };
                if let (Some((l_col, l_lit)), Some((r_col, r_lit))) =
                    (l.as_column_equality(), r.as_column_equality())
                {
                    if l_col == r_col && l_lit != r_lit {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Check if this expression is implied by `other` holding.
    ///
    /// Structural only: true when this expression equals `other` or one of
    /// its AND conjuncts.
    pub fn implied_by(&self, other: &Expression) -> bool {
        other.conjuncts().iter().any(|c| *c == self)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(v) => write!(f, "{v}"),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Comparison(v) => write!(f, "{v}"),
            Self::Conjunction(v) => write!(f, "{v}"),
        }
    }
}

impl From<ColumnExpr> for Expression {
    fn from(value: ColumnExpr) -> Self {
        Expression::Column(value)
    }
}

impl From<LiteralExpr> for Expression {
    fn from(value: LiteralExpr) -> Self {
        Expression::Literal(value)
    }
}

impl From<ComparisonExpr> for Expression {
    fn from(value: ComparisonExpr) -> Self {
        Expression::Comparison(value)
    }
}

impl From<ConjunctionExpr> for Expression {
    fn from(value: ConjunctionExpr) -> Self {
        Expression::Conjunction(value)
    }
}

pub fn col(name: impl Into<String>) -> Expression {
    Expression::Column(ColumnExpr::new(name))
}

pub fn lit(value: impl Into<ScalarValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        literal: value.into(),
    })
}

fn compare(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    Expression::Comparison(ComparisonExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    compare(ComparisonOperator::Eq, left, right)
}

pub fn not_eq(left: Expression, right: Expression) -> Expression {
    compare(ComparisonOperator::NotEq, left, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    compare(ComparisonOperator::Lt, left, right)
}

pub fn gt(left: Expression, right: Expression) -> Expression {
    compare(ComparisonOperator::Gt, left, right)
}

/// AND together expressions, flattening nested ANDs.
///
/// A single expression is returned unchanged rather than being wrapped.
pub fn and(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    let mut flattened = Vec::new();
    for expr in exprs {
        match expr {
            Expression::Conjunction(conj) if conj.op == ConjunctionOperator::And => {
                flattened.extend(conj.expressions)
            }
            other => flattened.push(other),
        }
    }

    match flattened.len() {
        0 => None,
        1 => flattened.pop(),
        _ => Some(Expression::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::And,
            expressions: flattened,
        })),
    }
}
