use riptide_error::{Result, RiptideError};

use crate::arrays::datatype::DataType;
use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Validates expression and operator types on the resolved plan.
///
/// Expressions that still contain unresolved references are skipped here;
/// the analyzer's final check rejects those plans outright.
#[derive(Debug)]
pub struct CheckTypes;

fn types_comparable(left: DataType, right: DataType) -> bool {
    left == DataType::Unknown
        || right == DataType::Unknown
        || left == right
        || (left.is_numeric() && right.is_numeric())
}

fn check_expr(expr: &Expression) -> Result<()> {
    match expr {
        Expression::Arith(arith) => {
            let left = arith.left.datatype();
            let right = arith.right.datatype();
            if !(left == DataType::Unknown || left.is_numeric())
                || !(right == DataType::Unknown || right.is_numeric())
            {
                return Err(RiptideError::resolution(
                    format!("arithmetic requires numeric operands, have {left} and {right}"),
                    expr.to_string(),
                ));
            }
        }
        Expression::Comparison(cmp) => {
            let left = cmp.left.datatype();
            let right = cmp.right.datatype();
            if !types_comparable(left, right) {
                return Err(RiptideError::resolution(
                    format!("cannot compare {left} to {right}"),
                    expr.to_string(),
                ));
            }
        }
        Expression::Conjunction(conj) => {
            for child in &conj.expressions {
                let datatype = child.datatype();
                if !matches!(datatype, DataType::Boolean | DataType::Unknown) {
                    return Err(RiptideError::resolution(
                        format!("conjunction arguments must be boolean, have {datatype}"),
                        expr.to_string(),
                    ));
                }
            }
        }
        Expression::Negate(neg) => {
            let datatype = neg.expr.datatype();
            if !matches!(datatype, DataType::Boolean | DataType::Unknown) {
                return Err(RiptideError::resolution(
                    format!("NOT requires a boolean argument, have {datatype}"),
                    expr.to_string(),
                ));
            }
        }
        _ => (),
    }
    expr.for_each_child(&mut check_expr)
}

fn check_operator(op: &LogicalOperator) -> Result<()> {
    op.for_each_expr(&mut |expr| {
        if expr.contains_unresolved() {
            return Ok(());
        }
        check_expr(expr)
    })?;

    match op {
        LogicalOperator::Filter(n) => {
            let predicate = &n.node.predicate;
            if predicate.contains_unresolved() {
                return Ok(());
            }
            let datatype = predicate.datatype();
            if !matches!(datatype, DataType::Boolean | DataType::Unknown) {
                return Err(RiptideError::resolution(
                    format!("filter predicate must be boolean, have {datatype}"),
                    predicate.to_string(),
                ));
            }
        }
        LogicalOperator::SetOp(n) => {
            let left = n.children[0].output_attrs();
            let right = n.children[1].output_attrs();
            if left.len() != right.len() {
                return Err(RiptideError::resolution(
                    format!(
                        "union inputs must have the same number of columns, have {} and {}",
                        left.len(),
                        right.len()
                    ),
                    op.name().to_string(),
                ));
            }
            for (l, r) in left.iter().zip(&right) {
                if l.datatype != r.datatype
                    && l.datatype != DataType::Unknown
                    && r.datatype != DataType::Unknown
                {
                    return Err(RiptideError::resolution(
                        format!(
                            "union column types differ: {} is {}, {} is {}",
                            l.name, l.datatype, r.name, r.datatype
                        ),
                        op.name().to_string(),
                    ));
                }
            }
        }
        _ => (),
    }
    Ok(())
}

impl Rule<LogicalOperator> for CheckTypes {
    fn name(&self) -> &'static str {
        "check_types"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.for_each(&mut check_operator)?;
        Ok(plan)
    }
}
