//! Logical plan rewrites.

pub mod const_fold;
pub mod filter_pushdown;
pub mod prune_columns;
pub mod simplify_boolean;

use riptide_error::Result;
use tracing::debug;

use self::const_fold::ConstFold;
use self::filter_pushdown::PushDownFilter;
use self::prune_columns::PruneColumns;
use self::simplify_boolean::SimplifyBoolean;
use crate::logical::operator::LogicalOperator;
use crate::rules::{Batch, RuleExecutor};

/// Rewrites resolved plans into cheaper equivalent plans.
///
/// Batch order matters: expression rewrites may turn predicates into
/// constants that pushdown then moves or removes, and pruning counts the
/// columns of predicates only after they've settled next to their scans.
#[derive(Debug)]
pub struct Optimizer {
    executor: RuleExecutor,
}

impl Optimizer {
    pub fn new(executor: RuleExecutor) -> Self {
        Optimizer { executor }
    }

    pub fn optimize(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        let batches: [Batch<LogicalOperator>; 3] = [
            Batch::fixed_point(
                "expression_rewrites",
                vec![Box::new(ConstFold), Box::new(SimplifyBoolean)],
            ),
            Batch::fixed_point("filter_pushdown", vec![Box::new(PushDownFilter)]),
            Batch::once("column_pruning", vec![Box::new(PruneColumns)]),
        ];

        let plan = self.executor.run_batches(plan, &batches)?;
        debug!("optimization complete");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::attribute::Attribute;
    use crate::expr::{add, and_all, col, gt, lit, lt};
    use crate::runtime::collection::RowCollection;

    fn optimizer() -> Optimizer {
        Optimizer::new(RuleExecutor::default())
    }

    fn scan_with(names: &[&str]) -> (LogicalOperator, Vec<Attribute>) {
        let attrs: Vec<_> = names
            .iter()
            .map(|name| Attribute::new(*name, DataType::Int64, false))
            .collect();
        let scan = LogicalOperator::scan(None, RowCollection::empty(), attrs.clone());
        (scan, attrs)
    }

    #[test]
    fn output_attrs_preserved() {
        let (scan, attrs) = scan_with(&["a", "b"]);
        let plan = LogicalOperator::project(
            LogicalOperator::filter(
                scan,
                and_all([gt(col(&attrs[0]), add(lit(1), lit(2))), lit(true)]).unwrap(),
            ),
            vec![col(&attrs[0])],
        );

        let before = plan.output_attrs();
        let got = optimizer().optimize(plan).unwrap();
        assert_eq!(before, got.output_attrs());
    }

    #[test]
    fn batches_compose() {
        let (scan, attrs) = scan_with(&["a", "b"]);
        // true AND a < 1 + 2 over a projection: folding and simplification
        // leave a single comparison, pushdown moves it under the project,
        // pruning drops column b.
        let plan = LogicalOperator::filter(
            LogicalOperator::project(scan, vec![col(&attrs[0])]),
            and_all([lit(true), lt(col(&attrs[0]), add(lit(1), lit(2)))]).unwrap(),
        );

        let got = optimizer().optimize(plan).unwrap();
        match &got {
            LogicalOperator::Project(n) => match &n.children[0] {
                LogicalOperator::Filter(f) => {
                    assert_eq!(lt(col(&attrs[0]), lit(3)), f.node.predicate);
                    match &f.children[0] {
                        LogicalOperator::Scan(s) => {
                            assert_eq!(Some(vec![0]), s.node.projection)
                        }
                        other => panic!("unexpected operator: {}", other.name()),
                    }
                }
                other => panic!("unexpected operator: {}", other.name()),
            },
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn optimize_is_idempotent() {
        let (scan, attrs) = scan_with(&["a", "b"]);
        let plan = LogicalOperator::filter(
            LogicalOperator::project(scan, vec![col(&attrs[0])]),
            gt(col(&attrs[0]), add(lit(1), lit(2))),
        );

        let optimizer = optimizer();
        let once = optimizer.optimize(plan).unwrap();
        let twice = optimizer.optimize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
