use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Truncates its input after `limit` rows, skipping `offset` rows first.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLimit {
    pub offset: usize,
    pub limit: usize,
}

impl Explainable for LogicalLimit {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Limit").with_value("limit", self.limit);
        if self.offset > 0 {
            ent = ent.with_value("offset", self.offset);
        }
        ent
    }
}
