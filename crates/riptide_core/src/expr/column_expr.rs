use std::fmt;

use super::attribute::Attribute;

/// Reference to a resolved attribute produced by a descendant operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpr {
    pub attr: Attribute,
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attr)
    }
}

/// A column reference by display name, pending resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedColumnExpr {
    pub name: String,
}

impl fmt::Display for UnresolvedColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}", self.name)
    }
}
