use riptide_error::Result;

use super::plan::PhysicalPlan;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Skips `offset` rows then keeps at most `limit`. Requires a single
/// partition so row positions are well defined.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalLimit {
    pub input: Box<PhysicalPlan>,
    pub offset: usize,
    pub limit: usize,
}

impl PhysicalLimit {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.input.output_attrs()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        Partitioning::Single
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let rows = self.input.execute()?.collect();
        let limited = rows
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();
        Ok(RowCollection::single(limited))
    }
}

impl Explainable for PhysicalLimit {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Limit")
            .with_value("offset", self.offset)
            .with_value("limit", self.limit)
    }
}
