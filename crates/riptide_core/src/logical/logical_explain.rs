use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::logical::operator::LogicalOperator;

/// Renders the target plan's stages instead of executing it.
///
/// The target is held as node state rather than as a child so that resolving
/// the explain statement never resolves the target; failures inside the
/// target surface as explanation text, not as query errors.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExplain {
    pub verbose: bool,
    pub target: Box<LogicalOperator>,
    /// Output attributes, minted once at construction.
    pub attrs: Vec<Attribute>,
}

impl Explainable for LogicalExplain {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Explain").with_value("verbose", self.verbose)
    }
}
