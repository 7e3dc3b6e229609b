use riptide_error::Result;

use super::plan::PhysicalPlan;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Bag union. Output columns take the left input's attributes; the analyzer
/// has already checked the right side lines up positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalUnion {
    pub left: Box<PhysicalPlan>,
    pub right: Box<PhysicalPlan>,
}

impl PhysicalUnion {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.left.output_attrs()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        Partitioning::Unknown {
            partitions: self.left.output_partitioning().partition_count()
                + self.right.output_partitioning().partition_count(),
        }
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let left = self.left.execute()?;
        let right = self.right.execute()?;
        let mut rows = left.collect();
        rows.extend(right.collect());
        Ok(RowCollection::from_rows(
            rows,
            left.num_partitions() + right.num_partitions(),
        ))
    }
}

impl Explainable for PhysicalUnion {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Union")
    }
}
