use riptide_error::Result;

use crate::expr::{alias, lit, Expression};
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Wraps derived projection and grouping expressions in aliases.
///
/// Column and alias expressions already carry a stable attribute identity;
/// everything else gets one here so that repeated calls to `output_attrs` on
/// the analyzed plan agree. Runs after column resolution so names come from
/// the resolved expressions. Idempotent: an already aliased expression is
/// left alone.
#[derive(Debug)]
pub struct AliasProjections;

fn ensure_alias(expr: &mut Expression) {
    if matches!(expr, Expression::Column(_) | Expression::Alias(_)) {
        return;
    }
    let name = expr.output_name();
    let inner = std::mem::replace(expr, lit(crate::arrays::scalar::ScalarValue::Null));
    *expr = alias(inner, name);
}

impl Rule<LogicalOperator> for AliasProjections {
    fn name(&self) -> &'static str {
        "alias_projections"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.transform_up(&mut |mut op| {
            match &mut op {
                LogicalOperator::Project(n) => {
                    for expr in &mut n.node.projections {
                        ensure_alias(expr);
                    }
                }
                LogicalOperator::Aggregate(n) => {
                    for expr in &mut n.node.group_exprs {
                        ensure_alias(expr);
                    }
                }
                _ => (),
            }
            Ok(op)
        })
    }
}
