use std::collections::HashMap;

use riptide_error::{Result, RiptideError};

use super::plan::PhysicalPlan;
use crate::arrays::row::Row;
use crate::arrays::scalar::ScalarValue;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::aggregate_expr::{AggregateExpr, AggregateFunction};
use crate::expr::attribute::Attribute;
use crate::expr::evaluate::evaluate;
use crate::expr::Expression;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::{Distribution, Partitioning};

/// Partition-local hash aggregation.
///
/// Correctness relies on the redistribution pass having placed all rows with
/// equal grouping values in the same partition (or a single partition for a
/// global aggregate), so each partition can aggregate independently.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalHashAggregate {
    pub input: Box<PhysicalPlan>,
    pub group_exprs: Vec<Expression>,
    pub aggregates: Vec<AggregateExpr>,
}

impl PhysicalHashAggregate {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        let mut attrs: Vec<_> = self.group_exprs.iter().map(|e| e.output_attr()).collect();
        attrs.extend(self.aggregates.iter().map(|agg| agg.output_attr()));
        attrs
    }

    /// Column ids the grouping expressions read; these are the hash keys for
    /// the required input distribution.
    pub fn grouping_key_ids(&self) -> Vec<crate::expr::attribute::AttributeId> {
        let mut refs = Vec::new();
        for expr in &self.group_exprs {
            expr.collect_column_refs(&mut refs);
        }
        refs.into_iter().map(|attr| attr.id).collect()
    }

    pub fn required_input_distribution(&self) -> Distribution {
        if self.group_exprs.is_empty() {
            return Distribution::Single;
        }
        let keys = self.grouping_key_ids();
        if keys.is_empty() {
            // Constant grouping expressions put every row in one group.
            Distribution::Single
        } else {
            Distribution::Hash { keys }
        }
    }

    pub fn output_partitioning(&self) -> Partitioning {
        match self.required_input_distribution() {
            Distribution::Single => Partitioning::Single,
            _ => Partitioning::Unknown {
                partitions: self.input.output_partitioning().partition_count(),
            },
        }
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let input_attrs = self.input.output_attrs();
        let rows = self.input.execute()?;
        let partitioning = self.output_partitioning();

        let aggregated = rows.map_partitions(|part| {
            let mut groups: HashMap<Vec<ScalarValue>, Vec<Accumulator>> = HashMap::new();
            // Group encounter order is kept for deterministic output.
            let mut order: Vec<Vec<ScalarValue>> = Vec::new();

            for row in part {
                let key = self
                    .group_exprs
                    .iter()
                    .map(|expr| evaluate(expr, &input_attrs, row))
                    .collect::<Result<Vec<_>>>()?;
                let accs = match groups.get_mut(&key) {
                    Some(accs) => accs,
                    None => {
                        order.push(key.clone());
                        groups.entry(key).or_insert_with(|| {
                            self.aggregates
                                .iter()
                                .map(|agg| Accumulator::new(agg.func))
                                .collect()
                        })
                    }
                };
                for (acc, agg) in accs.iter_mut().zip(&self.aggregates) {
                    acc.update(evaluate(&agg.input, &input_attrs, row)?)?;
                }
            }

            // A global aggregate over no rows still produces one row.
            if self.group_exprs.is_empty() && order.is_empty() {
                let columns = self
                    .aggregates
                    .iter()
                    .map(|agg| Accumulator::new(agg.func).finish())
                    .collect();
                return Ok(vec![Row { columns }]);
            }

            let mut out = Vec::with_capacity(order.len());
            for key in order {
                let accs = groups.remove(&key).ok_or_else(|| {
                    RiptideError::internal("group disappeared during aggregation")
                })?;
                let mut columns = key;
                columns.extend(accs.into_iter().map(Accumulator::finish));
                out.push(Row { columns });
            }
            Ok(out)
        })?;
        Ok(aggregated.with_partitioning(partitioning))
    }
}

impl Explainable for PhysicalHashAggregate {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("HashAggregate")
            .with_values("groups", self.group_exprs.iter())
            .with_values("aggregates", self.aggregates.iter())
    }
}

/// Running state for one aggregate within one group.
#[derive(Debug)]
struct Accumulator {
    func: AggregateFunction,
    count: i64,
    sum: ScalarValue,
    min: ScalarValue,
    max: ScalarValue,
}

impl Accumulator {
    fn new(func: AggregateFunction) -> Self {
        Accumulator {
            func,
            count: 0,
            sum: ScalarValue::Null,
            min: ScalarValue::Null,
            max: ScalarValue::Null,
        }
    }

    /// Nulls are skipped by every aggregate function.
    fn update(&mut self, value: ScalarValue) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        self.count += 1;

        match self.func {
            AggregateFunction::Count => (),
            AggregateFunction::Sum | AggregateFunction::Avg => {
                self.sum = add_values(&self.sum, &value)?;
            }
            AggregateFunction::Min => {
                if self.min.is_null() || value.total_cmp(&self.min).is_lt() {
                    self.min = value;
                }
            }
            AggregateFunction::Max => {
                if self.max.is_null() || value.total_cmp(&self.max).is_gt() {
                    self.max = value;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> ScalarValue {
        match self.func {
            AggregateFunction::Count => ScalarValue::Int64(self.count),
            AggregateFunction::Sum => self.sum,
            AggregateFunction::Min => self.min,
            AggregateFunction::Max => self.max,
            AggregateFunction::Avg => {
                if self.count == 0 {
                    return ScalarValue::Null;
                }
                match self.sum {
                    ScalarValue::Int64(v) => ScalarValue::Float64(v as f64 / self.count as f64),
                    ScalarValue::Float64(v) => ScalarValue::Float64(v / self.count as f64),
                    other => other,
                }
            }
        }
    }
}

fn add_values(acc: &ScalarValue, value: &ScalarValue) -> Result<ScalarValue> {
    use ScalarValue::*;
    match (acc, value) {
        (Null, v) => Ok(v.clone()),
        (Int64(a), Int64(b)) => Ok(Int64(a.wrapping_add(*b))),
        (Int64(a), Float64(b)) => Ok(Float64(*a as f64 + b)),
        (Float64(a), Int64(b)) => Ok(Float64(a + *b as f64)),
        (Float64(a), Float64(b)) => Ok(Float64(a + b)),
        (a, b) => Err(RiptideError::internal(format!(
            "cannot sum {a} and {b}"
        ))),
    }
}
