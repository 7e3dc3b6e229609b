use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;

/// Returns the child plan's output schema as rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalDescribe {
    /// Output attributes, minted once at construction.
    pub attrs: Vec<Attribute>,
}

impl Explainable for LogicalDescribe {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Describe")
    }
}
