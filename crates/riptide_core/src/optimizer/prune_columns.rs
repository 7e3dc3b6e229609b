use std::collections::HashSet;

use riptide_error::Result;

use crate::expr::attribute::AttributeId;
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Restricts scans to the columns the rest of the plan actually reads.
///
/// A column is needed if any expression in the tree references it or if it
/// is part of the plan's own output. Runs once, after filter pushdown, so
/// pushed predicates count toward the columns their scan must produce.
#[derive(Debug)]
pub struct PruneColumns;

impl Rule<LogicalOperator> for PruneColumns {
    fn name(&self) -> &'static str {
        "prune_columns"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        let mut needed: HashSet<AttributeId> =
            plan.output_attrs().iter().map(|attr| attr.id).collect();
        plan.for_each(&mut |op| {
            op.for_each_expr(&mut |expr| {
                expr.collect_column_ids(&mut needed);
                Ok(())
            })?;
            for id in barrier_child_ids(op) {
                needed.insert(id);
            }
            for agg in aggregate_outputs(op) {
                needed.insert(agg);
            }
            Ok(())
        })?;

        plan.transform_up(&mut |mut op| {
            if let LogicalOperator::Scan(n) = &mut op {
                if n.node.projection.is_none() {
                    let indices: Vec<usize> = n
                        .node
                        .attrs
                        .iter()
                        .enumerate()
                        .filter(|(_, attr)| needed.contains(&attr.id))
                        .map(|(idx, _)| idx)
                        .collect();
                    if indices.len() < n.node.attrs.len() {
                        n.node.projection = Some(indices);
                    }
                }
            }
            Ok(op)
        })
    }
}

/// Operators whose own output does not enumerate their children's
/// attributes are pruning barriers: a command reports fixed command columns,
/// and a set op aligns its children positionally, so every column a child
/// produces must survive.
fn barrier_child_ids(op: &LogicalOperator) -> Vec<AttributeId> {
    if !op.is_command() && !matches!(op, LogicalOperator::SetOp(_)) {
        return Vec::new();
    }
    op.children()
        .iter()
        .flat_map(|child| child.output_attrs())
        .map(|attr| attr.id)
        .collect()
}

/// Attribute ids an aggregate operator introduces; these are outputs, not
/// scan columns, but marking them needed keeps the bookkeeping uniform.
fn aggregate_outputs(op: &LogicalOperator) -> Vec<AttributeId> {
    match op {
        LogicalOperator::Aggregate(n) => n
            .node
            .aggregates
            .iter()
            .map(|agg| agg.output_attr().id)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::attribute::Attribute;
    use crate::expr::{col, gt, lit};
    use crate::runtime::collection::RowCollection;

    fn wide_scan() -> (LogicalOperator, Vec<Attribute>) {
        let attrs = vec![
            Attribute::new("a", DataType::Int64, false),
            Attribute::new("b", DataType::Int64, false),
            Attribute::new("c", DataType::Utf8, true),
        ];
        let scan = LogicalOperator::scan(None, RowCollection::empty(), attrs.clone());
        (scan, attrs)
    }

    #[test]
    fn unused_columns_pruned() {
        let (scan, attrs) = wide_scan();
        let plan = LogicalOperator::project(
            LogicalOperator::filter(scan, gt(col(&attrs[1]), lit(0))),
            vec![col(&attrs[0])],
        );

        let got = PruneColumns.apply(plan).unwrap();
        let mut projection = None;
        got.for_each(&mut |op| {
            if let LogicalOperator::Scan(n) = op {
                projection = n.node.projection.clone();
            }
            Ok(())
        })
        .unwrap();
        // Column c is never read, a and b are.
        assert_eq!(Some(vec![0, 1]), projection);
    }

    #[test]
    fn describe_child_keeps_its_columns() {
        let (scan, _) = wide_scan();
        let plan = LogicalOperator::describe(scan);

        let got = PruneColumns.apply(plan).unwrap();
        got.for_each(&mut |op| {
            if let LogicalOperator::Scan(n) = op {
                assert_eq!(None, n.node.projection);
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn union_children_keep_their_columns() {
        let (left, _) = wide_scan();
        let (right, _) = wide_scan();
        let plan = LogicalOperator::union(left, right);

        let got = PruneColumns.apply(plan).unwrap();
        let mut scans = 0;
        got.for_each(&mut |op| {
            if let LogicalOperator::Scan(n) = op {
                scans += 1;
                assert_eq!(None, n.node.projection);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(2, scans);
    }

    #[test]
    fn output_columns_stay() {
        let (scan, attrs) = wide_scan();
        // Plan output is the whole scan, nothing can be pruned.
        let plan = LogicalOperator::filter(scan, gt(col(&attrs[0]), lit(0)));

        let before = plan.output_attrs();
        let got = PruneColumns.apply(plan).unwrap();
        assert_eq!(before, got.output_attrs());
        got.for_each(&mut |op| {
            if let LogicalOperator::Scan(n) = op {
                assert_eq!(None, n.node.projection);
            }
            Ok(())
        })
        .unwrap();
    }
}
