use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::aggregate_expr::AggregateExpr;
use crate::expr::attribute::Attribute;
use crate::expr::Expression;

/// Grouped aggregation.
///
/// Output is the group expressions followed by the aggregates, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalAggregate {
    pub group_exprs: Vec<Expression>,
    pub aggregates: Vec<AggregateExpr>,
}

impl LogicalAggregate {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.group_exprs
            .iter()
            .map(|e| e.output_attr())
            .chain(self.aggregates.iter().map(|a| a.output_attr()))
            .collect()
    }
}

impl Explainable for LogicalAggregate {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Aggregate")
            .with_values("group_by", self.group_exprs.iter())
            .with_values("aggregates", self.aggregates.iter())
    }
}
