use riptide_error::{Result, RiptideError};

use crate::expr::attribute::Attribute;
use crate::expr::{col, Expression};
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Binds unresolved column references against the attributes produced by an
/// operator's children.
///
/// A reference binds only when exactly one candidate matches. No candidates
/// leaves the reference unresolved for the analyzer's final check; two or
/// more is an immediate ambiguity error, since resolving more of the tree
/// can only add candidates.
#[derive(Debug)]
pub struct ResolveColumns {
    pub case_sensitive: bool,
}

impl ResolveColumns {
    fn matches(&self, name: &str, attr: &Attribute) -> bool {
        if self.case_sensitive {
            attr.name == name
        } else {
            attr.name.eq_ignore_ascii_case(name)
        }
    }

    fn resolve_expr(&self, expr: &mut Expression, input: &[Attribute]) -> Result<()> {
        if let Expression::Unresolved(unresolved) = expr {
            let mut candidates = input.iter().filter(|a| self.matches(&unresolved.name, a));
            match (candidates.next(), candidates.next()) {
                (Some(attr), None) => *expr = col(attr),
                (Some(first), Some(second)) => {
                    return Err(RiptideError::resolution(
                        format!(
                            "column '{}' is ambiguous, candidates: {first}, {second}",
                            unresolved.name
                        ),
                        expr.to_string(),
                    ));
                }
                // Leave unbound, candidates may appear in a later iteration.
                (None, _) => (),
            }
        }
        expr.for_each_child_mut(&mut |child| self.resolve_expr(child, input))
    }
}

impl Rule<LogicalOperator> for ResolveColumns {
    fn name(&self) -> &'static str {
        "resolve_columns"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.transform_up(&mut |mut op| {
            let input: Vec<Attribute> = op
                .children()
                .iter()
                .flat_map(|child| child.output_attrs())
                .collect();
            op.for_each_expr_mut(&mut |expr| self.resolve_expr(expr, &input))?;
            Ok(op)
        })
    }
}
