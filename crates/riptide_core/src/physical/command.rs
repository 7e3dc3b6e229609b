use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use riptide_error::Result;

use crate::arrays::row::Row;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// The side effect behind a command node. Implementations live in the engine
/// since effects touch session state.
pub trait CommandEffect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Perform the effect and produce the command's output rows.
    fn run(&self) -> Result<Vec<Row>>;
}

/// Zero-child plan node wrapping a side effecting statement.
///
/// The effect runs exactly once, the first time the node is executed; the
/// produced rows are memoized. Clones share the memo cell, so copies of the
/// plan made by later rewrite passes still observe a single effect.
#[derive(Debug, Clone)]
pub struct PhysicalCommand {
    pub attrs: Vec<Attribute>,
    effect: Arc<dyn CommandEffect>,
    result: Arc<Mutex<Option<Vec<Row>>>>,
}

impl PhysicalCommand {
    pub fn new(attrs: Vec<Attribute>, effect: Arc<dyn CommandEffect>) -> Self {
        PhysicalCommand {
            attrs,
            effect,
            result: Arc::new(Mutex::new(None)),
        }
    }

    pub fn output_attrs(&self) -> Vec<Attribute> {
        self.attrs.clone()
    }

    pub fn output_partitioning(&self) -> Partitioning {
        Partitioning::Single
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let mut result = self.result.lock();
        let rows = match result.as_ref() {
            Some(rows) => rows.clone(),
            None => {
                let rows = self.effect.run()?;
                *result = Some(rows.clone());
                rows
            }
        };
        Ok(RowCollection::single(rows))
    }
}

/// Identity comparison; two command nodes are the same plan node only if
/// they share the same effect and memo.
impl PartialEq for PhysicalCommand {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.result, &other.result)
    }
}

impl Explainable for PhysicalCommand {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Command").with_value("effect", self.effect.name())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::row;

    #[derive(Debug)]
    struct CountingEffect {
        runs: AtomicUsize,
    }

    impl CommandEffect for CountingEffect {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&self) -> Result<Vec<Row>> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(vec![row!["ok"]])
        }
    }

    #[test]
    fn effect_runs_exactly_once() {
        let effect = Arc::new(CountingEffect {
            runs: AtomicUsize::new(0),
        });
        let command = PhysicalCommand::new(Vec::new(), effect.clone());

        let first = command.execute().unwrap().collect();
        let second = command.execute().unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(1, effect.runs.load(Ordering::SeqCst));
    }

    #[test]
    fn clones_share_the_memo() {
        let effect = Arc::new(CountingEffect {
            runs: AtomicUsize::new(0),
        });
        let command = PhysicalCommand::new(Vec::new(), effect.clone());
        let copy = command.clone();

        command.execute().unwrap();
        copy.execute().unwrap();
        assert_eq!(1, effect.runs.load(Ordering::SeqCst));
    }
}
