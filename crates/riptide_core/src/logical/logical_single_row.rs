use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Leaf operator producing exactly one empty row.
///
/// Used for SELECT-without-FROM style plans and as the placeholder value when
/// taking an operator out of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalSingleRow;

impl Explainable for LogicalSingleRow {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("SingleRow")
    }
}
