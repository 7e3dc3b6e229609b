//! Turns raw plans into resolved plans.

pub mod alias_projections;
pub mod check_types;
pub mod resolve_columns;
pub mod resolve_relations;

use std::sync::Arc;

use riptide_error::{Result, RiptideError};
use tracing::debug;

use self::alias_projections::AliasProjections;
use self::check_types::CheckTypes;
use self::resolve_columns::ResolveColumns;
use self::resolve_relations::ResolveRelations;
use crate::catalog::SessionCatalog;
use crate::expr::Expression;
use crate::explain::explainable::ExplainConfig;
use crate::explain::formatter::format_tree;
use crate::logical::operator::LogicalOperator;
use crate::rules::{Batch, RuleExecutor};

/// Resolves names and validates types against a session catalog.
///
/// Resolution runs to a fixed point since substituting a registered plan can
/// itself introduce unresolved names. Aliasing and type checks then run once
/// over the settled tree, and anything still unresolved is an error.
#[derive(Debug)]
pub struct Analyzer {
    catalog: Arc<SessionCatalog>,
    executor: RuleExecutor,
}

impl Analyzer {
    pub fn new(catalog: Arc<SessionCatalog>, executor: RuleExecutor) -> Self {
        Analyzer { catalog, executor }
    }

    pub fn resolve(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        let batches: [Batch<LogicalOperator>; 2] = [
            Batch::fixed_point(
                "resolution",
                vec![
                    Box::new(ResolveRelations {
                        catalog: self.catalog.clone(),
                    }),
                    Box::new(ResolveColumns {
                        case_sensitive: self.catalog.case_sensitive(),
                    }),
                ],
            ),
            Batch::once(
                "finalize",
                vec![Box::new(AliasProjections), Box::new(CheckTypes)],
            ),
        ];

        let plan = self.executor.run_batches(plan, &batches)?;
        check_analysis(&plan)?;
        debug!("analysis complete");
        Ok(plan)
    }
}

/// Rejects plans that still contain unresolved names after resolution has
/// settled.
fn check_analysis(plan: &LogicalOperator) -> Result<()> {
    fn collect_unresolved(expr: &Expression, out: &mut Vec<String>) -> Result<()> {
        if let Expression::Unresolved(col) = expr {
            out.push(format!("column '{}'", col.name));
        }
        expr.for_each_child(&mut |child| collect_unresolved(child, out))
    }

    let mut missing = Vec::new();
    plan.for_each(&mut |op| {
        if let LogicalOperator::UnresolvedScan(n) = op {
            missing.push(format!("table '{}'", n.node.table));
        }
        op.for_each_expr(&mut |expr| collect_unresolved(expr, &mut missing))
    })?;

    if missing.is_empty() {
        return Ok(());
    }
    Err(RiptideError::resolution(
        format!("unresolved references: {}", missing.join(", ")),
        format_tree(plan, ExplainConfig::default()),
    ))
}
