use riptide_error::Result;

use super::plan::PhysicalPlan;
use crate::arrays::row::Row;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::expr::evaluate::evaluate;
use crate::expr::Expression;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Row-wise projection evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalProject {
    pub input: Box<PhysicalPlan>,
    pub projections: Vec<Expression>,
}

impl PhysicalProject {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.projections.iter().map(|e| e.output_attr()).collect()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        let input = self.input.output_partitioning();
        match &input {
            // Hash layout survives only if every key column is passed through.
            Partitioning::Hash { keys, .. } => {
                let kept: Vec<_> = self.output_attrs().iter().map(|a| a.id).collect();
                if keys.iter().all(|key| kept.contains(key)) {
                    input
                } else {
                    Partitioning::Unknown {
                        partitions: input.partition_count(),
                    }
                }
            }
            _ => input,
        }
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let input_attrs = self.input.output_attrs();
        let rows = self.input.execute()?;
        let partitioning = self.output_partitioning();
        let projected = rows.map(|row| {
            let columns = self
                .projections
                .iter()
                .map(|expr| evaluate(expr, &input_attrs, row))
                .collect::<Result<Vec<_>>>()?;
            Ok(Row { columns })
        })?;
        Ok(projected.with_partitioning(partitioning))
    }
}

impl Explainable for PhysicalProject {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Project").with_values("projections", self.projections.iter())
    }
}
