use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::expr::Expression;

/// Computes a list of expressions over its input.
///
/// After analysis every top level projection is either a bare column
/// reference or an alias, so the derived output attributes are stable.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalProject {
    pub projections: Vec<Expression>,
}

impl LogicalProject {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.projections.iter().map(|e| e.output_attr()).collect()
    }
}

impl Explainable for LogicalProject {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Project").with_values("projections", self.projections.iter())
    }
}
