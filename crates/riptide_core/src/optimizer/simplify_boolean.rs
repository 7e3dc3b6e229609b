use riptide_error::Result;

use crate::arrays::scalar::ScalarValue;
use crate::expr::conjunction_expr::ConjunctionOperator;
use crate::expr::{and_all, lit, or_all, Expression};
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Boolean shortcuts over literal true/false operands, plus removal of
/// filters whose predicate is literally true.
///
/// `AND` drops true operands and collapses to false on any false operand;
/// `OR` mirrors that. Double negation cancels. Null literals are left alone,
/// three valued logic is the evaluator's job.
#[derive(Debug)]
pub struct SimplifyBoolean;

fn as_bool_literal(expr: &Expression) -> Option<bool> {
    match expr {
        Expression::Literal(l) => match l.literal {
            ScalarValue::Boolean(b) => Some(b),
            _ => None,
        },
        _ => None,
    }
}

fn simplify(expr: &mut Expression) -> Result<()> {
    expr.for_each_child_mut(&mut simplify)?;

    match expr {
        Expression::Conjunction(conj) => {
            let op = conj.op;
            let (shortcut, identity) = match op {
                ConjunctionOperator::And => (false, true),
                ConjunctionOperator::Or => (true, false),
            };
            if conj.expressions.iter().any(|e| as_bool_literal(e) == Some(shortcut)) {
                *expr = lit(shortcut);
                return Ok(());
            }
            let remaining: Vec<_> = conj
                .expressions
                .drain(..)
                .filter(|e| as_bool_literal(e) != Some(identity))
                .collect();
            let rebuilt = match op {
                ConjunctionOperator::And => and_all(remaining),
                ConjunctionOperator::Or => or_all(remaining),
            };
            *expr = rebuilt.unwrap_or(lit(identity));
        }
        Expression::Negate(neg) => match neg.expr.as_mut() {
            Expression::Negate(inner) => {
                *expr = (*inner.expr).clone();
            }
            inner => {
                if let Some(b) = as_bool_literal(inner) {
                    *expr = lit(!b);
                }
            }
        },
        _ => (),
    }
    Ok(())
}

impl Rule<LogicalOperator> for SimplifyBoolean {
    fn name(&self) -> &'static str {
        "simplify_boolean"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.transform_up(&mut |mut op| {
            op.for_each_expr_mut(&mut simplify)?;
            // A filter that always passes is a no-op.
            if let LogicalOperator::Filter(n) = &mut op {
                if as_bool_literal(&n.node.predicate) == Some(true) {
                    return n.take_one_child_exact();
                }
            }
            Ok(op)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::attribute::Attribute;
    use crate::expr::{col, gt, not};
    use crate::runtime::collection::RowCollection;

    fn scan() -> (LogicalOperator, Attribute) {
        let a = Attribute::new("a", DataType::Int64, false);
        let scan = LogicalOperator::scan(None, RowCollection::empty(), vec![a.clone()]);
        (scan, a)
    }

    #[test]
    fn and_with_true_drops_operand() {
        let (scan, a) = scan();
        let pred = and_all([gt(col(&a), lit(0)), lit(true)]).unwrap();
        let plan = LogicalOperator::filter(scan, pred);

        let got = SimplifyBoolean.apply(plan).unwrap();
        match got {
            LogicalOperator::Filter(n) => assert_eq!(gt(col(&a), lit(0)), n.node.predicate),
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn and_with_false_collapses() {
        let (scan, a) = scan();
        let pred = and_all([gt(col(&a), lit(0)), lit(false)]).unwrap();
        let plan = LogicalOperator::filter(scan, pred);

        let got = SimplifyBoolean.apply(plan).unwrap();
        match got {
            LogicalOperator::Filter(n) => assert_eq!(lit(false), n.node.predicate),
            other => panic!("unexpected operator: {}", other.name()),
        }
    }

    #[test]
    fn always_true_filter_removed() {
        let (scan, _) = scan();
        let plan = LogicalOperator::filter(scan.clone(), lit(true));

        let got = SimplifyBoolean.apply(plan).unwrap();
        assert_eq!(scan, got);
    }

    #[test]
    fn double_negation_cancels() {
        let (scan, a) = scan();
        let plan = LogicalOperator::filter(scan, not(not(gt(col(&a), lit(0)))));

        let got = SimplifyBoolean.apply(plan).unwrap();
        match got {
            LogicalOperator::Filter(n) => assert_eq!(gt(col(&a), lit(0)), n.node.predicate),
            other => panic!("unexpected operator: {}", other.name()),
        }
    }
}
