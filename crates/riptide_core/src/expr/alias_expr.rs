use std::fmt;

use super::attribute::AttributeId;
use super::Expression;

/// Renames the result of an expression.
///
/// Carries its own attribute id so that the output attribute derived from a
/// projection is stable across repeated schema computations.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasExpr {
    pub id: AttributeId,
    pub name: String,
    pub expr: Box<Expression>,
}

impl fmt::Display for AliasExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}{}", self.expr, self.name, self.id)
    }
}
