use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Materializes the named table into an in-memory cached relation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalCacheTable {
    pub table: String,
}

impl Explainable for LogicalCacheTable {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("CacheTable").with_value("table", &self.table)
    }
}

/// Releases the named table's cached relation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalUncacheTable {
    pub table: String,
}

impl Explainable for LogicalUncacheTable {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("UncacheTable").with_value("table", &self.table)
    }
}
