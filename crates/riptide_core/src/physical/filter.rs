use riptide_error::Result;

use super::plan::PhysicalPlan;
use crate::arrays::scalar::ScalarValue;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::expr::evaluate::evaluate;
use crate::expr::Expression;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Keeps rows whose predicate evaluates to true. NULL counts as not passing.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalFilter {
    pub input: Box<PhysicalPlan>,
    pub predicate: Expression,
}

impl PhysicalFilter {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.input.output_attrs()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        self.input.output_partitioning()
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let input_attrs = self.input.output_attrs();
        let rows = self.input.execute()?;
        rows.filter(|row| {
            Ok(matches!(
                evaluate(&self.predicate, &input_attrs, row)?,
                ScalarValue::Boolean(true)
            ))
        })
    }
}

impl Explainable for PhysicalFilter {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.predicate)
    }
}
