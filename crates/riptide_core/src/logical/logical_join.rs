use std::fmt;

use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Cross,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Cross => write!(f, "CROSS"),
        }
    }
}

/// Joins two children on an optional condition.
///
/// Cross joins carry no condition; a missing condition on an inner join is
/// treated as cross.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalJoin {
    pub join_type: JoinType,
    pub condition: Option<Expression>,
}

impl Explainable for LogicalJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Join").with_value("type", self.join_type);
        if let Some(condition) = &self.condition {
            ent = ent.with_value("condition", condition);
        }
        ent
    }
}
