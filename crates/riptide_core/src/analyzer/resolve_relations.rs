use std::sync::Arc;

use riptide_error::Result;

use crate::catalog::SessionCatalog;
use crate::logical::operator::LogicalOperator;
use crate::rules::Rule;

/// Replaces unresolved scans with the plans registered under their names.
///
/// Names missing from the catalog are left in place; the analyzer's final
/// check reports them once the fixed point is reached. Substituted plans may
/// themselves contain unresolved scans, which later iterations pick up.
#[derive(Debug)]
pub struct ResolveRelations {
    pub catalog: Arc<SessionCatalog>,
}

impl Rule<LogicalOperator> for ResolveRelations {
    fn name(&self) -> &'static str {
        "resolve_relations"
    }

    fn apply(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.transform_up(&mut |op| match op {
            LogicalOperator::UnresolvedScan(n) => match self.catalog.lookup_table(&n.node.table) {
                Ok(resolved) => Ok(resolved),
                Err(_) => Ok(LogicalOperator::UnresolvedScan(n)),
            },
            other => Ok(other),
        })
    }
}
