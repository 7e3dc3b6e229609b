use std::collections::{HashMap, HashSet};

use riptide_error::{Result, RiptideError};

use crate::expr::attribute::AttributeId;
use crate::expr::{and_all, split_conjunction, Expression};
use crate::logical::logical_join::{JoinType, LogicalJoin};
use crate::logical::operator::{LogicalOperator, Node};
use crate::rules::Rule;

/// Moves filters closer to scans.
///
/// Each application pushes every filter at most one operator down; the
/// enclosing fixed point batch repeats until nothing moves. Filters stop at
/// scans, aggregates, limits and set ops.
#[derive(Debug)]
pub struct PushDownFilter;

impl Rule<LogicalOperator> for PushDownFilter {
    fn name(&self) -> &'static str {
        "push_down_filter"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.transform_up(&mut push_step)
    }
}

fn push_step(op: LogicalOperator) -> Result<LogicalOperator> {
    let mut filter = match op {
        LogicalOperator::Filter(n) => n,
        other => return Ok(other),
    };
    let child = filter.take_one_child_exact()?;
    let predicate = filter.node.predicate;

    match child {
        // Stacked filters merge into a single conjunction.
        LogicalOperator::Filter(mut inner) => {
            let grandchild = inner.take_one_child_exact()?;
            let merged = and_all([predicate, inner.node.predicate]).ok_or_else(|| {
                RiptideError::internal("merging two filter predicates produced no expression")
            })?;
            Ok(LogicalOperator::filter(grandchild, merged))
        }
        // Filters commute with sorts.
        LogicalOperator::Order(mut order) => {
            let grandchild = order.take_one_child_exact()?;
            Ok(LogicalOperator::order(
                LogicalOperator::filter(grandchild, predicate),
                order.node.sort_exprs,
            ))
        }
        // Inline projection expressions into the predicate, then move the
        // filter below the projection.
        LogicalOperator::Project(mut project) => {
            match inline_projections(&predicate, &project.node.projections) {
                Some(inlined) => {
                    let grandchild = project.take_one_child_exact()?;
                    Ok(LogicalOperator::project(
                        LogicalOperator::filter(grandchild, inlined),
                        project.node.projections,
                    ))
                }
                None => Ok(reassemble(predicate, LogicalOperator::Project(project))),
            }
        }
        LogicalOperator::Join(join) => push_into_join(predicate, join),
        other => Ok(reassemble(predicate, other)),
    }
}

fn reassemble(predicate: Expression, child: LogicalOperator) -> LogicalOperator {
    LogicalOperator::filter(child, predicate)
}

/// Rewrite column references in `predicate` to the expressions the projection
/// computes for them. Returns None if the predicate references a column the
/// projection doesn't produce.
fn inline_projections(predicate: &Expression, projections: &[Expression]) -> Option<Expression> {
    let mut mapping: HashMap<AttributeId, Expression> = HashMap::new();
    for proj in projections {
        match proj {
            Expression::Column(col) => {
                mapping.insert(col.attr.id, proj.clone());
            }
            Expression::Alias(alias) => {
                mapping.insert(alias.id, (*alias.expr).clone());
            }
            _ => return None,
        }
    }

    fn substitute(
        expr: &Expression,
        mapping: &HashMap<AttributeId, Expression>,
    ) -> Option<Expression> {
        if let Expression::Column(col) = expr {
            return mapping.get(&col.attr.id).cloned();
        }
        let mut out = expr.clone();
        let mut ok = true;
        out.for_each_child_mut(&mut |child| {
            match substitute(child, mapping) {
                Some(replaced) => *child = replaced,
                None => ok = false,
            }
            Ok(())
        })
        .ok()?;
        ok.then_some(out)
    }

    substitute(predicate, &mapping)
}

/// Push conjuncts that reference only one side of a join into that side.
///
/// Inner and cross joins accept pushes to either side. Left joins only
/// accept pushes to the preserved side, filtering the right input would
/// change which rows get null padding.
fn push_into_join(
    predicate: Expression,
    mut join: Node<LogicalJoin>,
) -> Result<LogicalOperator> {
    let [left, right] = join.take_two_children_exact()?;

    let left_ids: HashSet<AttributeId> = left.output_attrs().iter().map(|a| a.id).collect();
    let right_ids: HashSet<AttributeId> = right.output_attrs().iter().map(|a| a.id).collect();
    let push_right_allowed = !matches!(join.node.join_type, JoinType::Left);

    let mut conjuncts = Vec::new();
    split_conjunction(predicate, &mut conjuncts);

    let mut push_left = Vec::new();
    let mut push_right = Vec::new();
    let mut remaining = Vec::new();
    for conjunct in conjuncts {
        let mut ids = HashSet::new();
        conjunct.collect_column_ids(&mut ids);
        if !ids.is_empty() && ids.is_subset(&left_ids) {
            push_left.push(conjunct);
        } else if push_right_allowed && !ids.is_empty() && ids.is_subset(&right_ids) {
            push_right.push(conjunct);
        } else {
            remaining.push(conjunct);
        }
    }

    let left = match and_all(push_left) {
        Some(pred) => LogicalOperator::filter(left, pred),
        None => left,
    };
    let right = match and_all(push_right) {
        Some(pred) => LogicalOperator::filter(right, pred),
        None => right,
    };

    let joined = LogicalOperator::join(left, right, join.node.join_type, join.node.condition);
    Ok(match and_all(remaining) {
        Some(pred) => LogicalOperator::filter(joined, pred),
        None => joined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::attribute::Attribute;
    use crate::expr::{add, alias, col, gt, lit, lt};
    use crate::runtime::collection::RowCollection;

    fn scan_with(names: &[&str]) -> (LogicalOperator, Vec<Attribute>) {
        let attrs: Vec<_> = names
            .iter()
            .map(|name| Attribute::new(*name, DataType::Int64, false))
            .collect();
        let scan = LogicalOperator::scan(None, RowCollection::empty(), attrs.clone());
        (scan, attrs)
    }

    #[test]
    fn stacked_filters_merge() {
        let (scan, attrs) = scan_with(&["a"]);
        let plan = LogicalOperator::filter(
            LogicalOperator::filter(scan, gt(col(&attrs[0]), lit(0))),
            lt(col(&attrs[0]), lit(10)),
        );

        let got = PushDownFilter.apply(plan).unwrap();
        match &got {
            LogicalOperator::Filter(n) => {
                assert!(matches!(n.node.predicate, Expression::Conjunction(_)));
                assert!(matches!(n.children[0], LogicalOperator::Scan(_)));
            }
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn filter_moves_below_projection() {
        let (scan, attrs) = scan_with(&["a"]);
        let doubled = alias(add(col(&attrs[0]), col(&attrs[0])), "doubled");
        let out = doubled.output_attr();

        let plan = LogicalOperator::filter(
            LogicalOperator::project(scan, vec![doubled]),
            gt(col(&out), lit(10)),
        );

        let got = PushDownFilter.apply(plan).unwrap();
        match &got {
            LogicalOperator::Project(n) => match &n.children[0] {
                LogicalOperator::Filter(f) => {
                    // Predicate now references the inlined expression.
                    assert_eq!(
                        gt(add(col(&attrs[0]), col(&attrs[0])), lit(10)),
                        f.node.predicate
                    );
                }
                other => panic!("unexpected operator: {}", other.name()),
            },
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn join_splits_sided_conjuncts() {
        let (left, left_attrs) = scan_with(&["a"]);
        let (right, right_attrs) = scan_with(&["b"]);
        let plan = LogicalOperator::filter(
            LogicalOperator::join(
                left,
                right,
                JoinType::Inner,
                Some(crate::expr::eq(col(&left_attrs[0]), col(&right_attrs[0]))),
            ),
            and_all([
                gt(col(&left_attrs[0]), lit(0)),
                lt(col(&right_attrs[0]), lit(10)),
            ])
            .unwrap(),
        );

        let got = PushDownFilter.apply(plan).unwrap();
        match &got {
            LogicalOperator::Join(n) => {
                assert!(matches!(n.children[0], LogicalOperator::Filter(_)));
                assert!(matches!(n.children[1], LogicalOperator::Filter(_)));
            }
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn left_join_keeps_right_side_filter_above() {
        let (left, _) = scan_with(&["a"]);
        let (right, right_attrs) = scan_with(&["b"]);
        let plan = LogicalOperator::filter(
            LogicalOperator::join(left, right, JoinType::Left, None),
            lt(col(&right_attrs[0]), lit(10)),
        );

        let got = PushDownFilter.apply(plan).unwrap();
        match &got {
            LogicalOperator::Filter(n) => {
                assert!(matches!(n.children[0], LogicalOperator::Join(_)));
            }
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn filter_stops_at_aggregate() {
        let (scan, attrs) = scan_with(&["a"]);
        let agg = LogicalOperator::aggregate(scan, vec![col(&attrs[0])], Vec::new());
        let plan = LogicalOperator::filter(agg, gt(col(&attrs[0]), lit(0)));

        let got = PushDownFilter.apply(plan.clone()).unwrap();
        assert_eq!(plan, got);
    }
}
