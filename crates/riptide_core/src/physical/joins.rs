use std::collections::HashMap;

use riptide_error::Result;

use super::plan::PhysicalPlan;
use crate::arrays::row::Row;
use crate::arrays::scalar::ScalarValue;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::expr::evaluate::evaluate;
use crate::expr::Expression;
use crate::logical::logical_join::JoinType;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::{Distribution, Partitioning};

/// Fallback join: materializes both sides into one partition and compares
/// every pair. Handles any join type and any (or no) condition.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalNestedLoopJoin {
    pub left: Box<PhysicalPlan>,
    pub right: Box<PhysicalPlan>,
    pub join_type: JoinType,
    pub condition: Option<Expression>,
}

impl PhysicalNestedLoopJoin {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        join_output_attrs(&self.left, &self.right, self.join_type)
    }

    pub fn output_partitioning(&self) -> Partitioning {
        Partitioning::Single
    }

    pub fn required_input_distributions(&self) -> [Distribution; 2] {
        [Distribution::Single, Distribution::Single]
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let attrs = self.output_attrs();
        let left_rows = self.left.execute()?.collect();
        let right_rows = self.right.execute()?.collect();
        let right_width = self.right.output_attrs().len();

        let mut out = Vec::new();
        for left_row in &left_rows {
            let mut matched = false;
            for right_row in &right_rows {
                let combined = concat_rows(left_row, right_row);
                if self.condition_holds(&attrs, &combined)? {
                    matched = true;
                    out.push(combined);
                }
            }
            // Unmatched left rows survive a left join with null padding.
            if !matched && self.join_type == JoinType::Left {
                let mut columns = left_row.columns.clone();
                columns.extend(std::iter::repeat(ScalarValue::Null).take(right_width));
                out.push(Row { columns });
            }
        }
        Ok(RowCollection::single(out))
    }

    fn condition_holds(&self, attrs: &[Attribute], row: &Row) -> Result<bool> {
        match &self.condition {
            Some(condition) => Ok(matches!(
                evaluate(condition, attrs, row)?,
                ScalarValue::Boolean(true)
            )),
            None => Ok(true),
        }
    }
}

impl Explainable for PhysicalNestedLoopJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("NestedLoopJoin").with_value("type", self.join_type);
        if let Some(condition) = &self.condition {
            ent = ent.with_value("condition", condition);
        }
        ent
    }
}

/// Partition-wise equi join.
///
/// Requires both inputs hash distributed on their join keys with the same
/// partition count; the redistribution pass guarantees both. Each partition
/// builds a table from its right input and probes with its left input.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalHashJoin {
    pub left: Box<PhysicalPlan>,
    pub right: Box<PhysicalPlan>,
    pub left_keys: Vec<Expression>,
    pub right_keys: Vec<Expression>,
}

impl PhysicalHashJoin {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        join_output_attrs(&self.left, &self.right, JoinType::Inner)
    }

    pub fn output_partitioning(&self) -> Partitioning {
        self.left.output_partitioning()
    }

    pub fn required_input_distributions(&self) -> [Distribution; 2] {
        [
            Distribution::Hash {
                keys: key_column_ids(&self.left_keys),
            },
            Distribution::Hash {
                keys: key_column_ids(&self.right_keys),
            },
        ]
    }

    pub fn execute(&self) -> Result<RowCollection> {
        let left_attrs = self.left.output_attrs();
        let right_attrs = self.right.output_attrs();
        let left_data = self.left.execute()?;
        let right_data = self.right.execute()?;

        let partitioning = self.output_partitioning();
        let joined = left_data.zip_partitions(&right_data, |left_part, right_part| {
            let mut table: HashMap<Vec<ScalarValue>, Vec<&Row>> = HashMap::new();
            for row in right_part {
                let key = eval_keys(&self.right_keys, &right_attrs, row)?;
                // NULL keys never match anything in an equi join.
                if key.iter().any(ScalarValue::is_null) {
                    continue;
                }
                table.entry(key).or_default().push(row);
            }

            let mut out = Vec::new();
            for left_row in left_part {
                let key = eval_keys(&self.left_keys, &left_attrs, left_row)?;
                if key.iter().any(ScalarValue::is_null) {
                    continue;
                }
                if let Some(matches) = table.get(&key) {
                    for right_row in matches {
                        out.push(concat_rows(left_row, right_row));
                    }
                }
            }
            Ok(out)
        })?;
        Ok(joined.with_partitioning(partitioning))
    }
}

impl Explainable for PhysicalHashJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("HashJoin")
            .with_values("left_keys", self.left_keys.iter())
            .with_values("right_keys", self.right_keys.iter())
    }
}

pub(crate) fn key_column_ids(keys: &[Expression]) -> Vec<crate::expr::attribute::AttributeId> {
    let mut refs = Vec::new();
    for key in keys {
        key.collect_column_refs(&mut refs);
    }
    refs.into_iter().map(|attr| attr.id).collect()
}

fn join_output_attrs(
    left: &PhysicalPlan,
    right: &PhysicalPlan,
    join_type: JoinType,
) -> Vec<Attribute> {
    let mut attrs = left.output_attrs();
    let right_attrs = right.output_attrs();
    match join_type {
        JoinType::Left => attrs.extend(right_attrs.into_iter().map(|mut attr| {
            attr.nullable = true;
            attr
        })),
        _ => attrs.extend(right_attrs),
    }
    attrs
}

fn eval_keys(keys: &[Expression], attrs: &[Attribute], row: &Row) -> Result<Vec<ScalarValue>> {
    keys.iter().map(|key| evaluate(key, attrs, row)).collect()
}

fn concat_rows(left: &Row, right: &Row) -> Row {
    let mut columns = left.columns.clone();
    columns.extend(right.columns.iter().cloned());
    Row { columns }
}
