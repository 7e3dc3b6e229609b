use std::fmt;

use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
}

impl fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Union => write!(f, "UNION"),
        }
    }
}

/// Bag union of two children.
///
/// Children must agree in arity and column types; output attributes come
/// from the left child.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalSetOp {
    pub kind: SetOpKind,
}

impl Explainable for LogicalSetOp {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("SetOp").with_value("kind", self.kind)
    }
}
