//! Strategy based lowering of logical plans.

use std::fmt;

use riptide_error::{Result, RiptideError};
use tracing::debug;

use super::aggregate::PhysicalHashAggregate;
use super::filter::PhysicalFilter;
use super::joins::{PhysicalHashJoin, PhysicalNestedLoopJoin};
use super::limit::PhysicalLimit;
use super::plan::PhysicalPlan;
use super::project::PhysicalProject;
use super::scan::PhysicalScan;
use super::sort::PhysicalSort;
use super::union::PhysicalUnion;
use super::values::PhysicalValues;
use crate::arrays::row::Row;
use crate::expr::attribute::AttributeId;
use crate::expr::{and_all, col, split_conjunction, Expression};
use crate::logical::logical_join::JoinType;
use crate::logical::logical_scan::LogicalScan;
use crate::logical::operator::LogicalOperator;

/// Lowers one class of logical operators into candidate physical plans.
///
/// Returning an empty candidate list means the strategy doesn't apply to
/// this node and the next strategy in line is consulted.
pub trait Strategy: fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply(&self, plan: &LogicalOperator, planner: &QueryPlanner)
        -> Result<Vec<PhysicalPlan>>;
}

/// Ordered strategy list.
///
/// The first strategy producing at least one candidate wins, and its first
/// candidate is used. Choosing among multiple candidates by cost is a
/// recognized extension point that is deliberately not taken.
#[derive(Debug)]
pub struct QueryPlanner {
    strategies: Vec<Box<dyn Strategy>>,
}

impl QueryPlanner {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        QueryPlanner { strategies }
    }

    /// Planner with the built-in strategies for data plans. Callers may
    /// prepend higher-priority strategies (the engine adds one for
    /// commands).
    pub fn with_default_strategies(mut extra: Vec<Box<dyn Strategy>>) -> Self {
        extra.push(Box::new(ScanStrategy));
        extra.push(Box::new(AggregationStrategy));
        extra.push(Box::new(HashJoinStrategy));
        extra.push(Box::new(BasicOperators));
        Self::new(extra)
    }

    pub fn plan(&self, plan: &LogicalOperator) -> Result<PhysicalPlan> {
        for strategy in &self.strategies {
            let mut candidates = strategy.apply(plan, self)?;
            if !candidates.is_empty() {
                debug!(
                    strategy = strategy.name(),
                    candidates = candidates.len(),
                    operator = plan.name(),
                    "strategy matched"
                );
                return Ok(candidates.swap_remove(0));
            }
        }
        Err(RiptideError::Planning {
            operator: plan.name().to_string(),
        })
    }
}

/// Column pruning and filter placement over a scan leaf.
///
/// The scan is restricted to the columns the projections and predicates
/// read, emitted in projection order. When the projection list is itself a
/// plain column list and the predicates read no column outside it, the
/// restricted scan already has the right shape and no Project node is added.
/// Otherwise an explicit Project evaluates the list, with filter-only
/// columns available underneath it but absent from the output.
pub fn prune_filter_project(
    projections: &[Expression],
    predicate: Option<&Expression>,
    scan: &LogicalScan,
) -> Result<PhysicalPlan> {
    let mut conjuncts = Vec::new();
    if let Some(predicate) = predicate {
        split_conjunction(predicate.clone(), &mut conjuncts);
    }

    let mut project_ids = Vec::new();
    for expr in projections {
        collect_ids_ordered(expr, &mut project_ids);
    }
    let mut filter_ids = Vec::new();
    for conjunct in &conjuncts {
        collect_ids_ordered(conjunct, &mut filter_ids);
    }

    // A plain list references each column once; [a, a] still needs a
    // Project since the scan produces every column a single time.
    let plain = projections
        .iter()
        .all(|expr| matches!(expr, Expression::Column(_)))
        && projections.len() == project_ids.len();
    let covered = filter_ids.iter().all(|id| project_ids.contains(id));
    let scan_is_output = plain && covered;

    let mut scan_ids = project_ids;
    for id in filter_ids {
        if !scan_ids.contains(&id) {
            scan_ids.push(id);
        }
    }

    let available = scan.output_attrs();
    let indices = scan_ids
        .iter()
        .map(|id| {
            available
                .iter()
                .position(|attr| attr.id == *id)
                .ok_or_else(|| {
                    RiptideError::internal(format!("column {id} not produced by scan"))
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    // Compose with a restriction the optimizer may already have applied.
    let identity = indices.len() == scan.attrs.len()
        && scan.projection.is_none()
        && indices.iter().enumerate().all(|(pos, &idx)| pos == idx);
    let projection = if identity {
        None
    } else {
        Some(match &scan.projection {
            Some(existing) => indices.iter().map(|&idx| existing[idx]).collect(),
            None => indices,
        })
    };

    let mut plan = PhysicalPlan::Scan(PhysicalScan {
        table: scan.table.clone(),
        collection: scan.collection.clone(),
        attrs: scan.attrs.clone(),
        projection,
    });

    if let Some(predicate) = and_all(conjuncts) {
        plan = PhysicalPlan::Filter(PhysicalFilter {
            input: Box::new(plan),
            predicate,
        });
    }

    if !scan_is_output {
        plan = PhysicalPlan::Project(PhysicalProject {
            input: Box::new(plan),
            projections: projections.to_vec(),
        });
    }
    Ok(plan)
}

fn collect_ids_ordered(expr: &Expression, out: &mut Vec<AttributeId>) {
    let mut refs = Vec::new();
    expr.collect_column_refs(&mut refs);
    for attr in refs {
        if !out.contains(&attr.id) {
            out.push(attr.id);
        }
    }
}

/// Project/Filter combinations directly over a scan leaf.
#[derive(Debug)]
pub struct ScanStrategy;

impl Strategy for ScanStrategy {
    fn name(&self) -> &'static str {
        "scans"
    }

    fn apply(
        &self,
        plan: &LogicalOperator,
        _planner: &QueryPlanner,
    ) -> Result<Vec<PhysicalPlan>> {
        let candidate = match plan {
            LogicalOperator::Project(project) => match &project.children[0] {
                LogicalOperator::Filter(filter) => match &filter.children[0] {
                    LogicalOperator::Scan(scan) => prune_filter_project(
                        &project.node.projections,
                        Some(&filter.node.predicate),
                        &scan.node,
                    )?,
                    _ => return Ok(Vec::new()),
                },
                LogicalOperator::Scan(scan) => {
                    prune_filter_project(&project.node.projections, None, &scan.node)?
                }
                _ => return Ok(Vec::new()),
            },
            LogicalOperator::Filter(filter) => match &filter.children[0] {
                LogicalOperator::Scan(scan) => {
                    // Filter straight over a scan keeps every scan column.
                    let projections: Vec<_> =
                        scan.node.output_attrs().iter().map(col).collect();
                    prune_filter_project(
                        &projections,
                        Some(&filter.node.predicate),
                        &scan.node,
                    )?
                }
                _ => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        };
        Ok(vec![candidate])
    }
}

/// Grouped and global aggregation.
#[derive(Debug)]
pub struct AggregationStrategy;

impl Strategy for AggregationStrategy {
    fn name(&self) -> &'static str {
        "aggregation"
    }

    fn apply(&self, plan: &LogicalOperator, planner: &QueryPlanner) -> Result<Vec<PhysicalPlan>> {
        match plan {
            LogicalOperator::Aggregate(n) => {
                let input = planner.plan(&n.children[0])?;
                Ok(vec![PhysicalPlan::HashAggregate(PhysicalHashAggregate {
                    input: Box::new(input),
                    group_exprs: n.node.group_exprs.clone(),
                    aggregates: n.node.aggregates.clone(),
                })])
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Inner joins with at least one equality conjunct become hash joins; any
/// non-equi conjuncts are applied as a filter above the join.
#[derive(Debug)]
pub struct HashJoinStrategy;

impl Strategy for HashJoinStrategy {
    fn name(&self) -> &'static str {
        "hash_join"
    }

    fn apply(&self, plan: &LogicalOperator, planner: &QueryPlanner) -> Result<Vec<PhysicalPlan>> {
        let join = match plan {
            LogicalOperator::Join(n) if n.node.join_type == JoinType::Inner => n,
            _ => return Ok(Vec::new()),
        };
        let condition = match &join.node.condition {
            Some(condition) => condition,
            None => return Ok(Vec::new()),
        };

        let left_ids: Vec<AttributeId> = join.children[0]
            .output_attrs()
            .iter()
            .map(|a| a.id)
            .collect();
        let right_ids: Vec<AttributeId> = join.children[1]
            .output_attrs()
            .iter()
            .map(|a| a.id)
            .collect();

        let mut conjuncts = Vec::new();
        split_conjunction(condition.clone(), &mut conjuncts);

        let mut left_keys = Vec::new();
        let mut right_keys = Vec::new();
        let mut residual = Vec::new();
        for conjunct in conjuncts {
            match split_equi_conjunct(&conjunct, &left_ids, &right_ids) {
                Some((left, right)) => {
                    left_keys.push(left);
                    right_keys.push(right);
                }
                None => residual.push(conjunct),
            }
        }
        if left_keys.is_empty() {
            return Ok(Vec::new());
        }

        let left = planner.plan(&join.children[0])?;
        let right = planner.plan(&join.children[1])?;
        let mut plan = PhysicalPlan::HashJoin(PhysicalHashJoin {
            left: Box::new(left),
            right: Box::new(right),
            left_keys,
            right_keys,
        });
        if let Some(predicate) = and_all(residual) {
            plan = PhysicalPlan::Filter(PhysicalFilter {
                input: Box::new(plan),
                predicate,
            });
        }
        Ok(vec![plan])
    }
}

/// If `conjunct` is an equality between an expression over only left columns
/// and one over only right columns, return the (left, right) key pair.
fn split_equi_conjunct(
    conjunct: &Expression,
    left_ids: &[AttributeId],
    right_ids: &[AttributeId],
) -> Option<(Expression, Expression)> {
    let cmp = match conjunct {
        Expression::Comparison(cmp)
            if cmp.op == crate::expr::comparison_expr::ComparisonOperator::Eq =>
        {
            cmp
        }
        _ => return None,
    };

    let side = |expr: &Expression| -> Option<bool> {
        let mut refs = Vec::new();
        expr.collect_column_refs(&mut refs);
        if refs.is_empty() {
            return None;
        }
        if refs.iter().all(|a| left_ids.contains(&a.id)) {
            Some(true)
        } else if refs.iter().all(|a| right_ids.contains(&a.id)) {
            Some(false)
        } else {
            None
        }
    };

    match (side(&cmp.left), side(&cmp.right)) {
        (Some(true), Some(false)) => Some(((*cmp.left).clone(), (*cmp.right).clone())),
        (Some(false), Some(true)) => Some(((*cmp.right).clone(), (*cmp.left).clone())),
        _ => None,
    }
}

/// Catch-all one-to-one lowering for operators no earlier strategy claimed.
#[derive(Debug)]
pub struct BasicOperators;

impl Strategy for BasicOperators {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn apply(&self, plan: &LogicalOperator, planner: &QueryPlanner) -> Result<Vec<PhysicalPlan>> {
        let candidate = match plan {
            LogicalOperator::Scan(n) => PhysicalPlan::Scan(PhysicalScan {
                table: n.node.table.clone(),
                collection: n.node.collection.clone(),
                attrs: n.node.attrs.clone(),
                projection: n.node.projection.clone(),
            }),
            LogicalOperator::Project(n) => PhysicalPlan::Project(PhysicalProject {
                input: Box::new(planner.plan(&n.children[0])?),
                projections: n.node.projections.clone(),
            }),
            LogicalOperator::Filter(n) => PhysicalPlan::Filter(PhysicalFilter {
                input: Box::new(planner.plan(&n.children[0])?),
                predicate: n.node.predicate.clone(),
            }),
            LogicalOperator::Join(n) => PhysicalPlan::NestedLoopJoin(PhysicalNestedLoopJoin {
                left: Box::new(planner.plan(&n.children[0])?),
                right: Box::new(planner.plan(&n.children[1])?),
                join_type: n.node.join_type,
                condition: n.node.condition.clone(),
            }),
            LogicalOperator::Order(n) => PhysicalPlan::Sort(PhysicalSort {
                input: Box::new(planner.plan(&n.children[0])?),
                sort_exprs: n.node.sort_exprs.clone(),
            }),
            LogicalOperator::Limit(n) => PhysicalPlan::Limit(PhysicalLimit {
                input: Box::new(planner.plan(&n.children[0])?),
                offset: n.node.offset,
                limit: n.node.limit,
            }),
            LogicalOperator::SetOp(n) => PhysicalPlan::Union(PhysicalUnion {
                left: Box::new(planner.plan(&n.children[0])?),
                right: Box::new(planner.plan(&n.children[1])?),
            }),
            LogicalOperator::SingleRow(_) => PhysicalPlan::Values(PhysicalValues {
                attrs: Vec::new(),
                rows: vec![Row::empty()],
            }),
            // Aggregates belong to the aggregation strategy. Unresolved
            // scans and commands have no lowering here; commands are claimed
            // by the engine's strategy.
            _ => return Ok(Vec::new()),
        };
        Ok(vec![candidate])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::attribute::Attribute;
    use crate::expr::{add, alias, eq, gt, lit};
    use crate::runtime::collection::RowCollection;

    fn planner() -> QueryPlanner {
        QueryPlanner::with_default_strategies(Vec::new())
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
    fn covered_filter_projection_needs_no_project_node() {
        let (scan, attrs) = scan_with(&["a", "b", "c", "d"]);
        let plan = LogicalOperator::project(
            LogicalOperator::filter(scan, gt(col(&attrs[0]), lit(0))),
            vec![col(&attrs[0]), col(&attrs[1])],
        );

        let got = planner().plan(&plan).unwrap();
        match &got {
            PhysicalPlan::Filter(f) => match f.input.as_ref() {
                PhysicalPlan::Scan(s) => {
                    // The filter only reads a, so the restricted scan is the
                    // output; c and d are gone.
                    assert_eq!(Some(vec![0, 1]), s.projection);
                }
                other => panic!("unexpected operator: {}", other.name()),
            },
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn filter_only_column_stays_beneath_a_project() {
        let (scan, attrs) = scan_with(&["a", "b", "c", "d"]);
        let plan = LogicalOperator::project(
            LogicalOperator::filter(scan, gt(col(&attrs[2]), lit(0))),
            vec![col(&attrs[0]), col(&attrs[1])],
        );

        let got = planner().plan(&plan).unwrap();
        match &got {
            PhysicalPlan::Project(p) => {
                // c feeds the filter but must not leak into the output.
                assert_eq!(2, p.output_attrs().len());
                match p.input.as_ref() {
                    PhysicalPlan::Filter(f) => match f.input.as_ref() {
                        PhysicalPlan::Scan(s) => {
                            assert_eq!(Some(vec![0, 1, 2]), s.projection);
                        }
                        other => panic!("unexpected operator: {}", other.name()),
                    },
                    other => panic!("unexpected operator: {}", other.name()),
                }
            }
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn plain_projection_reorders_scan_columns() {
        let (scan, attrs) = scan_with(&["a", "b", "c", "d"]);
        let plan = LogicalOperator::project(scan, vec![col(&attrs[1]), col(&attrs[0])]);

        let got = planner().plan(&plan).unwrap();
        match &got {
            PhysicalPlan::Scan(s) => {
                assert_eq!(Some(vec![1, 0]), s.projection);
                let names: Vec<_> = s.output_attrs().iter().map(|a| a.name.clone()).collect();
                assert_eq!(vec!["b", "a"], names);
            }
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn aggregate_claimed_by_aggregation_strategy() {
        let (scan, attrs) = scan_with(&["a"]);
        let plan = LogicalOperator::aggregate(scan, vec![col(&attrs[0])], Vec::new());

        let got = planner().plan(&plan).unwrap();
        assert!(matches!(got, PhysicalPlan::HashAggregate(_)));
    }

    #[test]
    fn derived_projection_gets_project_node() {
        let (scan, attrs) = scan_with(&["a", "b", "c", "d"]);
        let plan = LogicalOperator::project(
            scan,
            vec![alias(add(col(&attrs[0]), lit(1)), "a_plus_one")],
        );

        let got = planner().plan(&plan).unwrap();
        match &got {
            PhysicalPlan::Project(p) => match p.input.as_ref() {
                PhysicalPlan::Scan(s) => assert_eq!(Some(vec![0]), s.projection),
                other => panic!("unexpected operator: {}", other.name()),
            },
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn equi_join_becomes_hash_join() {
        let (left, left_attrs) = scan_with(&["a"]);
        let (right, right_attrs) = scan_with(&["b"]);
        let plan = LogicalOperator::join(
            left,
            right,
            JoinType::Inner,
            Some(eq(col(&left_attrs[0]), col(&right_attrs[0]))),
        );

        let got = planner().plan(&plan).unwrap();
        assert!(matches!(got, PhysicalPlan::HashJoin(_)));
    }

    #[test]
    fn non_equi_join_falls_back_to_nested_loop() {
        let (left, left_attrs) = scan_with(&["a"]);
        let (right, right_attrs) = scan_with(&["b"]);
        let plan = LogicalOperator::join(
            left,
            right,
            JoinType::Inner,
            Some(gt(col(&left_attrs[0]), col(&right_attrs[0]))),
        );

        let got = planner().plan(&plan).unwrap();
        assert!(matches!(got, PhysicalPlan::NestedLoopJoin(_)));
    }

    #[test]
    fn unplannable_node_is_a_planning_error() {
        let err = planner()
            .plan(&LogicalOperator::unresolved_scan("t"))
            .unwrap_err();
        assert!(matches!(err, RiptideError::Planning { .. }));
    }
}
