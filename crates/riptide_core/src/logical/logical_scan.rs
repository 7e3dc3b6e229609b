use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;

/// A reference to a table by name, pending catalog resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalUnresolvedScan {
    pub table: String,
}

impl Explainable for LogicalUnresolvedScan {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("UnresolvedScan").with_value("table", &self.table)
    }
}

/// A resolved scan over an external collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalScan {
    /// Name the relation was registered under, if any.
    pub table: Option<String>,
    /// The backing collection.
    pub collection: RowCollection,
    /// Attributes the scan produces, one per collection column.
    pub attrs: Vec<Attribute>,
    /// Columns the scan is restricted to, as indices into `attrs`.
    ///
    /// None means all columns. Set by the column pruning rule.
    pub projection: Option<Vec<usize>>,
}

impl LogicalScan {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        match &self.projection {
            Some(indices) => indices.iter().map(|&idx| self.attrs[idx].clone()).collect(),
            None => self.attrs.clone(),
        }
    }
}

impl Explainable for LogicalScan {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Scan");
        if let Some(table) = &self.table {
            ent = ent.with_value("table", table);
        }
        ent.with_values("columns", self.output_attrs().iter())
    }
}
