use riptide_error::Result;

use super::plan::PhysicalPlan;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::expr::evaluate::evaluate;
use crate::logical::logical_order::SortExpr;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Total sort. Requires all rows in a single partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalSort {
    pub input: Box<PhysicalPlan>,
    pub sort_exprs: Vec<SortExpr>,
}

impl PhysicalSort {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.input.output_attrs()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        Partitioning::Single
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let input_attrs = self.input.output_attrs();
        let mut rows = self.input.execute()?.collect();

        // Precompute sort keys so evaluation errors surface before sorting.
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows.drain(..) {
            let keys = self
                .sort_exprs
                .iter()
                .map(|sort| evaluate(&sort.expr, &input_attrs, &row))
                .collect::<Result<Vec<_>>>()?;
            keyed.push((keys, row));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            for ((av, bv), sort) in a.iter().zip(b).zip(&self.sort_exprs) {
                let ord = av.total_cmp(bv);
                let ord = if sort.desc { ord.reverse() } else { ord };
                if !ord.is_eq() {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });

        Ok(RowCollection::single(
            keyed.into_iter().map(|(_, row)| row).collect(),
        ))
    }
}

impl Explainable for PhysicalSort {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Sort").with_values("order", self.sort_exprs.iter())
    }
}
