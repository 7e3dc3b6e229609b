use std::sync::Arc;

use riptide_error::Result;

use super::query::QueryExecution;
use super::vars::SessionVars;
use crate::arrays::row::Row;
use crate::catalog::SessionCatalog;
use crate::logical::operator::LogicalOperator;

/// Process-wide entry point; a factory for isolated sessions.
#[derive(Debug, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Engine
    }

    pub fn new_session(&self) -> Session {
        Session::with_vars(SessionVars::new())
    }
}

/// State shared by a session and the query executions it spawns.
#[derive(Debug)]
pub struct SessionState {
    pub catalog: Arc<SessionCatalog>,
    pub vars: Arc<SessionVars>,
}

/// One user session: a catalog, settings, and a way to submit plans.
///
/// Sessions are fully isolated from each other; a registration in one is
/// never visible in another.
#[derive(Debug)]
pub struct Session {
    state: Arc<SessionState>,
}

impl Session {
    /// Create a session with explicit settings. Case sensitivity is read
    /// once here; changing the setting later affects only new sessions.
    pub fn with_vars(vars: SessionVars) -> Self {
        let vars = Arc::new(vars);
        let catalog = Arc::new(SessionCatalog::new(vars.case_sensitive()));
        Session {
            state: Arc::new(SessionState { catalog, vars }),
        }
    }

    pub fn catalog(&self) -> &SessionCatalog {
        &self.state.catalog
    }

    pub fn vars(&self) -> &SessionVars {
        &self.state.vars
    }

    pub fn register_table(&self, name: &str, plan: LogicalOperator) {
        self.state.catalog.register_table(name, plan);
    }

    pub fn unregister_table(&self, name: &str) -> Result<()> {
        self.state.catalog.unregister_table(name)
    }

    /// Submit a plan, returning its staged execution.
    pub fn submit(&self, plan: LogicalOperator) -> QueryExecution {
        QueryExecution::new(self.state.clone(), plan)
    }

    /// Submit and collect in one step.
    pub fn execute(&self, plan: LogicalOperator) -> Result<Vec<Row>> {
        self.submit(plan).collect()
    }
}
