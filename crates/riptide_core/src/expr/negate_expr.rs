use std::fmt;

use super::Expression;

/// Boolean NOT.
#[derive(Debug, Clone, PartialEq)]
pub struct NegateExpr {
    pub expr: Box<Expression>,
}

impl fmt::Display for NegateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOT {}", self.expr)
    }
}
