//! Row-wise interpreted expression evaluation.

use riptide_error::{Result, RiptideError};

use super::arith_expr::ArithOperator;
use super::attribute::Attribute;
use super::comparison_expr::ComparisonOperator;
use super::conjunction_expr::ConjunctionOperator;
use super::Expression;
use crate::arrays::row::Row;
use crate::arrays::scalar::ScalarValue;

/// Evaluate an expression against a row whose columns are described by
/// `input`.
///
/// Column references bind by attribute id; referencing an attribute the input
/// doesn't produce is an internal error (the analyzer guarantees it can't
/// happen for plans that went through resolution).
pub fn evaluate(expr: &Expression, input: &[Attribute], row: &Row) -> Result<ScalarValue> {
    match expr {
        Expression::Column(col) => {
            let idx = input
                .iter()
                .position(|attr| attr.id == col.attr.id)
                .ok_or_else(|| {
                    RiptideError::internal(format!(
                        "column {} not found in input attributes",
                        col.attr
                    ))
                })?;
            row.columns.get(idx).cloned().ok_or_else(|| {
                RiptideError::internal(format!("row too short for column index {idx}"))
            })
        }
        Expression::Unresolved(col) => Err(RiptideError::internal(format!(
            "attempted to evaluate unresolved column {col}"
        ))),
        Expression::Literal(lit) => Ok(lit.literal.clone()),
        Expression::Arith(arith) => {
            let left = evaluate(&arith.left, input, row)?;
            let right = evaluate(&arith.right, input, row)?;
            eval_arith(arith.op, left, right)
        }
        Expression::Comparison(cmp) => {
            let left = evaluate(&cmp.left, input, row)?;
            let right = evaluate(&cmp.right, input, row)?;
            Ok(eval_comparison(cmp.op, left, right))
        }
        Expression::Conjunction(conj) => {
            let mut values = Vec::with_capacity(conj.expressions.len());
            for expr in &conj.expressions {
                values.push(evaluate(expr, input, row)?);
            }
            eval_conjunction(conj.op, values)
        }
        Expression::Negate(neg) => match evaluate(&neg.expr, input, row)? {
            ScalarValue::Null => Ok(ScalarValue::Null),
            other => Ok(ScalarValue::Boolean(!other.try_as_bool()?)),
        },
        Expression::Alias(alias) => evaluate(&alias.expr, input, row),
    }
}

/// Evaluate an expression that references no columns.
pub fn try_eval_constant(expr: &Expression) -> Result<ScalarValue> {
    evaluate(expr, &[], &Row::empty())
}

fn eval_arith(op: ArithOperator, left: ScalarValue, right: ScalarValue) -> Result<ScalarValue> {
    use ScalarValue::*;

    if left.is_null() || right.is_null() {
        return Ok(Null);
    }

    match (left, right) {
        (Int64(l), Int64(r)) => Ok(match op {
            ArithOperator::Add => Int64(l.wrapping_add(r)),
            ArithOperator::Sub => Int64(l.wrapping_sub(r)),
            ArithOperator::Mul => Int64(l.wrapping_mul(r)),
            // Integer division by zero produces NULL rather than aborting the
            // whole query.
            ArithOperator::Div => {
                if r == 0 {
                    Null
                } else {
                    Int64(l.wrapping_div(r))
                }
            }
        }),
        (l, r) => {
            let l = as_f64(&l)?;
            let r = as_f64(&r)?;
            Ok(match op {
                ArithOperator::Add => Float64(l + r),
                ArithOperator::Sub => Float64(l - r),
                ArithOperator::Mul => Float64(l * r),
                ArithOperator::Div => Float64(l / r),
            })
        }
    }
}

fn as_f64(value: &ScalarValue) -> Result<f64> {
    match value {
        ScalarValue::Int64(v) => Ok(*v as f64),
        ScalarValue::Float64(v) => Ok(*v),
        other => Err(RiptideError::internal(format!(
            "arithmetic on non-numeric value: {other}"
        ))),
    }
}

fn eval_comparison(op: ComparisonOperator, left: ScalarValue, right: ScalarValue) -> ScalarValue {
    if left.is_null() || right.is_null() {
        return ScalarValue::Null;
    }
    let ord = left.total_cmp(&right);
    let result = match op {
        ComparisonOperator::Eq => ord.is_eq(),
        ComparisonOperator::NotEq => ord.is_ne(),
        ComparisonOperator::Lt => ord.is_lt(),
        ComparisonOperator::LtEq => ord.is_le(),
        ComparisonOperator::Gt => ord.is_gt(),
        ComparisonOperator::GtEq => ord.is_ge(),
    };
    ScalarValue::Boolean(result)
}

/// Three-valued AND/OR over the evaluated operands.
fn eval_conjunction(op: ConjunctionOperator, values: Vec<ScalarValue>) -> Result<ScalarValue> {
    let mut saw_null = false;
    for value in values {
        if value.is_null() {
            saw_null = true;
            continue;
        }
        let b = value.try_as_bool()?;
        match op {
            ConjunctionOperator::And if !b => return Ok(ScalarValue::Boolean(false)),
            ConjunctionOperator::Or if b => return Ok(ScalarValue::Boolean(true)),
            _ => (),
        }
    }
    if saw_null {
        return Ok(ScalarValue::Null);
    }
    Ok(ScalarValue::Boolean(matches!(
        op,
        ConjunctionOperator::And
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::{add, and_all, col, div, gt, lit, not, or_all};
    use crate::row;

    #[test]
    fn eval_column_by_identity() {
        let a = Attribute::new("a", DataType::Int64, false);
        let b = Attribute::new("b", DataType::Int64, false);
        let input = [a.clone(), b.clone()];

        let row = row![1, 2];
        assert_eq!(
            ScalarValue::Int64(2),
            evaluate(&col(&b), &input, &row).unwrap()
        );
    }

    #[test]
    fn eval_arith_int() {
        let got = try_eval_constant(&add(lit(4), lit(5))).unwrap();
        assert_eq!(ScalarValue::Int64(9), got);
    }

    #[test]
    fn eval_arith_mixed_promotes_to_float() {
        let got = try_eval_constant(&add(lit(4), lit(0.5))).unwrap();
        assert_eq!(ScalarValue::Float64(4.5), got);
    }

    #[test]
    fn int_divide_by_zero_is_null() {
        let got = try_eval_constant(&div(lit(4), lit(0))).unwrap();
        assert_eq!(ScalarValue::Null, got);
    }

    #[test]
    fn three_valued_and() {
        // false AND NULL => false
        let got =
            try_eval_constant(&and_all([lit(false), Expression::Literal(null_lit())]).unwrap())
                .unwrap();
        assert_eq!(ScalarValue::Boolean(false), got);

        // true AND NULL => NULL
        let got =
            try_eval_constant(&and_all([lit(true), Expression::Literal(null_lit())]).unwrap())
                .unwrap();
        assert_eq!(ScalarValue::Null, got);
    }

    #[test]
    fn three_valued_or() {
        // true OR NULL => true
        let got = try_eval_constant(&or_all([lit(true), Expression::Literal(null_lit())]).unwrap())
            .unwrap();
        assert_eq!(ScalarValue::Boolean(true), got);
    }

    #[test]
    fn not_null_is_null() {
        let got = try_eval_constant(&not(Expression::Literal(null_lit()))).unwrap();
        assert_eq!(ScalarValue::Null, got);
    }

    #[test]
    fn comparison_null_propagates() {
        let got = try_eval_constant(&gt(lit(1), Expression::Literal(null_lit()))).unwrap();
        assert_eq!(ScalarValue::Null, got);
    }

    fn null_lit() -> crate::expr::literal_expr::LiteralExpr {
        crate::expr::literal_expr::LiteralExpr {
            literal: ScalarValue::Null,
        }
    }
}
