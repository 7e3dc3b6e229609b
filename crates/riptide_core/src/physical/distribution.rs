use riptide_error::Result;

use super::exchange::PhysicalExchange;
use super::plan::PhysicalPlan;
use crate::rules::Rule;
use crate::runtime::partitioning::{Distribution, Partitioning};

/// Inserts exchange nodes wherever a child's layout doesn't satisfy its
/// parent's required distribution.
///
/// Runs in a Once batch after all other physical rewrites; it is the single
/// place cross-partition movement becomes explicit, so earlier passes can
/// ignore partitioning entirely. Both inputs of a hash join are exchanged
/// together whenever either needs it, keeping their partition counts equal.
#[derive(Debug)]
pub struct EnsureDistribution {
    pub shuffle_partitions: usize,
}

impl Rule<PhysicalPlan> for EnsureDistribution {
    fn name(&self) -> &'static str {
        "ensure_distribution"
    }

    fn apply(&self, plan: PhysicalPlan) -> Result<PhysicalPlan> {
        plan.transform_up(&mut |mut op| {
            let required = op.required_child_distributions();
            if required.is_empty() {
                return Ok(op);
            }

            let force_all = if let PhysicalPlan::HashJoin(join) = &op {
                let counts_match = join.left.output_partitioning().partition_count()
                    == join.right.output_partitioning().partition_count();
                let satisfied = join
                    .left
                    .output_partitioning()
                    .satisfies(&required[0])
                    && join.right.output_partitioning().satisfies(&required[1]);
                !(counts_match && satisfied)
            } else {
                false
            };

            for (child, dist) in op.children_mut().into_iter().zip(required) {
                let needs_exchange =
                    force_all || !child.output_partitioning().satisfies(&dist);
                if !needs_exchange {
                    continue;
                }
                let target = match dist {
                    Distribution::Any => continue,
                    Distribution::Single => Partitioning::Single,
                    Distribution::Hash { keys } => Partitioning::Hash {
                        keys,
                        partitions: self.shuffle_partitions,
                    },
                };
                let input = child.take();
                **child = PhysicalPlan::Exchange(PhysicalExchange {
                    input: Box::new(input),
                    target,
                });
            }
            Ok(op)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::aggregate_expr::{AggregateExpr, AggregateFunction};
    use crate::expr::attribute::Attribute;
    use crate::expr::col;
    use crate::logical::logical_order::SortExpr;
    use crate::physical::aggregate::PhysicalHashAggregate;
    use crate::physical::joins::PhysicalHashJoin;
    use crate::physical::scan::PhysicalScan;
    use crate::physical::sort::PhysicalSort;
    use crate::row;
    use crate::runtime::collection::RowCollection;

    fn scan(names: &[&str], partitions: usize) -> (PhysicalPlan, Vec<Attribute>) {
        let attrs: Vec<_> = names
            .iter()
            .map(|name| Attribute::new(*name, DataType::Int64, false))
            .collect();
        let rows = (0..4).map(|v| row![v]).collect();
        let plan = PhysicalPlan::Scan(PhysicalScan {
            table: None,
            collection: RowCollection::from_rows(rows, partitions),
            attrs: attrs.clone(),
            projection: None,
        });
        (plan, attrs)
    }

    fn rule() -> EnsureDistribution {
        EnsureDistribution {
            shuffle_partitions: 4,
        }
    }

    #[test]
    fn sort_over_partitioned_input_gets_coalescing_exchange() {
        let (input, attrs) = scan(&["a"], 3);
        let plan = PhysicalPlan::Sort(PhysicalSort {
            input: Box::new(input),
            sort_exprs: vec![SortExpr {
                expr: col(&attrs[0]),
                desc: false,
            }],
        });

        let got = rule().apply(plan).unwrap();
        match &got {
            PhysicalPlan::Sort(sort) => match sort.input.as_ref() {
                PhysicalPlan::Exchange(ex) => {
                    assert_eq!(Partitioning::Single, ex.target);
                }
                other => panic!("unexpected operator: {}", other.name()),
            },
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn single_partition_input_needs_no_exchange() {
        let (input, attrs) = scan(&["a"], 1);
        let plan = PhysicalPlan::Sort(PhysicalSort {
            input: Box::new(input),
            sort_exprs: vec![SortExpr {
                expr: col(&attrs[0]),
                desc: false,
            }],
        });

        let got = rule().apply(plan.clone()).unwrap();
        assert_eq!(plan, got);
    }

    #[test]
    fn grouped_aggregate_gets_hash_exchange() {
        let (input, attrs) = scan(&["a", "v"], 3);
        let plan = PhysicalPlan::HashAggregate(PhysicalHashAggregate {
            input: Box::new(input),
            group_exprs: vec![col(&attrs[0])],
            aggregates: vec![AggregateExpr::new(AggregateFunction::Sum, col(&attrs[1]))],
        });

        let got = rule().apply(plan).unwrap();
        match &got {
            PhysicalPlan::HashAggregate(agg) => match agg.input.as_ref() {
                PhysicalPlan::Exchange(ex) => match &ex.target {
                    Partitioning::Hash { keys, partitions } => {
                        assert_eq!(vec![attrs[0].id], *keys);
                        assert_eq!(4, *partitions);
                    }
                    other => panic!("unexpected target: {other}"),
                },
                other => panic!("unexpected operator: {}", other.name()),
            },
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn hash_join_exchanges_both_sides_together() {
        let (left, left_attrs) = scan(&["a"], 2);
        let (right, right_attrs) = scan(&["b"], 3);
        let plan = PhysicalPlan::HashJoin(PhysicalHashJoin {
            left: Box::new(left),
            right: Box::new(right),
            left_keys: vec![col(&left_attrs[0])],
            right_keys: vec![col(&right_attrs[0])],
        });

        let got = rule().apply(plan).unwrap();
        match &got {
            PhysicalPlan::HashJoin(join) => {
                assert!(matches!(join.left.as_ref(), PhysicalPlan::Exchange(_)));
                assert!(matches!(join.right.as_ref(), PhysicalPlan::Exchange(_)));
                assert_eq!(
                    join.left.output_partitioning().partition_count(),
                    join.right.output_partitioning().partition_count()
                );
            }
            other => panic!("unexpected operator: {}", other.name()),
        }
    }
}
