use std::fmt;

use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

/// A single sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct SortExpr {
    pub expr: Expression,
    pub desc: bool,
}

impl fmt::Display for SortExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.expr,
            if self.desc { "DESC" } else { "ASC" }
        )
    }
}

/// Totally orders its input by a list of sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOrder {
    pub sort_exprs: Vec<SortExpr>,
}

impl Explainable for LogicalOrder {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Order").with_values("sort_keys", self.sort_exprs.iter())
    }
}
