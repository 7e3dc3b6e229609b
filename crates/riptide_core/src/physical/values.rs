use riptide_error::Result;

use crate::arrays::row::Row;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Leaf producing a fixed set of rows. Plans with no relation input (for
/// example constant projections) bottom out here with a single empty row.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalValues {
    pub attrs: Vec<Attribute>,
    pub rows: Vec<Row>,
}

impl PhysicalValues {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.attrs.clone()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        Partitioning::Single
    }

    pub fn execute(&self) -> Result<RowCollection> {
        Ok(RowCollection::single(self.rows.clone()))
    }
}

impl Explainable for PhysicalValues {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Values").with_value("rows", self.rows.len())
    }
}
