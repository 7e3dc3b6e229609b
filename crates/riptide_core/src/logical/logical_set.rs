use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;

/// Session variable command.
///
/// Three forms, following the argument shape:
/// - key and value: apply the setting, return one confirmation row.
/// - key only: return one row with the current value.
/// - neither: return one row per configured key/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalSetVar {
    pub key: Option<String>,
    pub value: Option<String>,
    /// Output attributes, minted once at construction.
    pub attrs: Vec<Attribute>,
}

impl Explainable for LogicalSetVar {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("SetVar");
        if let Some(key) = &self.key {
            ent = ent.with_value("key", key);
        }
        if let Some(value) = &self.value {
            ent = ent.with_value("value", value);
        }
        ent
    }
}
