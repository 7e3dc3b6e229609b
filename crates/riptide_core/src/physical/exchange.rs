use riptide_error::{Result, RiptideError};

use super::plan::PhysicalPlan;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Explicit cross-partition data movement.
///
/// The only operator that moves rows between partitions; inserted by the
/// redistribution pass wherever a child's layout doesn't satisfy its
/// parent's requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalExchange {
    pub input: Box<PhysicalPlan>,
    pub target: Partitioning,
}

impl PhysicalExchange {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.input.output_attrs()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        self.target.clone()
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let input_attrs = self.input.output_attrs();
        let rows = self.input.execute()?;
        match &self.target {
            Partitioning::Single => Ok(rows.coalesce_single()),
            Partitioning::Hash { keys, partitions } => {
                let key_indices = keys
                    .iter()
                    .map(|key| {
                        input_attrs
                            .iter()
                            .position(|attr| attr.id == *key)
                            .ok_or_else(|| {
                                RiptideError::internal(format!(
                                    "exchange key {key} not produced by input"
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(rows
                    .repartition_hash(&key_indices, *partitions)
                    .with_partitioning(self.target.clone()))
            }
            Partitioning::Unknown { .. } => Err(RiptideError::internal(
                "exchange target must be a concrete layout",
            )),
        }
    }
}

impl Explainable for PhysicalExchange {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Exchange").with_value("target", &self.target)
    }
}
