use riptide_error::Result;

use crate::expr::evaluate::try_eval_constant;
use crate::expr::{lit, Expression};
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Evaluates constant subexpressions at plan time.
///
/// Aliases are never folded away since they carry the attribute identity of
/// a projection item; their inner expression is folded instead.
#[derive(Debug)]
pub struct ConstFold;

fn maybe_fold(expr: &mut Expression) -> Result<()> {
    match expr {
        Expression::Literal(_) => Ok(()),
        Expression::Alias(_) => expr.for_each_child_mut(&mut maybe_fold),
        other if other.is_const_foldable() => {
            let value = try_eval_constant(other)?;
            *other = lit(value);
            Ok(())
        }
        _ => expr.for_each_child_mut(&mut maybe_fold),
    }
}

impl Rule<LogicalOperator> for ConstFold {
    fn name(&self) -> &'static str {
        "const_fold"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.transform_up(&mut |mut op| {
            op.for_each_expr_mut(&mut maybe_fold)?;
            Ok(op)
        })
    }
}
