//! Side effecting commands, lowered ahead of every data strategy.

use std::sync::Arc;

use riptide_error::{Result, RiptideError};

use super::query::QueryExecution;
use super::session::SessionState;
use super::vars::SessionVars;
use crate::arrays::datatype::Schema;
use crate::arrays::row::Row;
use crate::arrays::scalar::ScalarValue;
use crate::logical::operator::LogicalOperator;
use crate::physical::command::{CommandEffect, PhysicalCommand};
use crate::physical::plan::PhysicalPlan;
use crate::physical::planner::{QueryPlanner, Strategy};
use crate::row;

/// Claims command operators before any data strategy sees them.
#[derive(Debug)]
pub struct CommandStrategy {
    pub state: Arc<SessionState>,
}

impl Strategy for CommandStrategy {
    fn name(&self) -> &'static str {
        "commands"
    }

    fn apply(
        &self,
        plan: &LogicalOperator,
        _planner: &QueryPlanner,
    ) -> Result<Vec<PhysicalPlan>> {
        let attrs = plan.output_attrs();
        let effect: Arc<dyn CommandEffect> = match plan {
            LogicalOperator::SetVar(n) => Arc::new(SetVarEffect {
                vars: self.state.vars.clone(),
                key: n.node.key.clone(),
                value: n.node.value.clone(),
            }),
            LogicalOperator::Explain(n) => Arc::new(ExplainEffect {
                state: self.state.clone(),
                target: n.node.target.as_ref().clone(),
                extended: n.node.verbose,
            }),
            LogicalOperator::Describe(n) => Arc::new(DescribeEffect {
                schema: Schema::new(
                    n.children[0].output_attrs().iter().map(|a| a.to_field()),
                ),
            }),
            LogicalOperator::CacheTable(n) => Arc::new(CacheEffect {
                state: self.state.clone(),
                table: n.node.table.clone(),
            }),
            LogicalOperator::UncacheTable(n) => Arc::new(UncacheEffect {
                state: self.state.clone(),
                table: n.node.table.clone(),
            }),
            _ => return Ok(Vec::new()),
        };
        Ok(vec![PhysicalPlan::Command(PhysicalCommand::new(
            attrs, effect,
        ))])
    }
}

/// Set a value, read one, or enumerate all settings.
#[derive(Debug)]
struct SetVarEffect {
    vars: Arc<SessionVars>,
    key: Option<String>,
    value: Option<String>,
}

impl CommandEffect for SetVarEffect {
    fn name(&self) -> &'static str {
        "set"
    }

    fn run(&self) -> Result<Vec<Row>> {
        match (&self.key, &self.value) {
            (Some(key), Some(value)) => {
                self.vars.set(key, value)?;
                Ok(vec![row![key.clone(), value.clone()]])
            }
            (Some(key), None) => {
                let value = self
                    .vars
                    .get(key)
                    .unwrap_or_else(|| "<undefined>".to_string());
                Ok(vec![row![key.clone(), value]])
            }
            (None, None) => Ok(self
                .vars
                .entries()
                .into_iter()
                .map(|(key, value)| row![key, value])
                .collect()),
            (None, Some(_)) => Err(RiptideError::invalid_argument(
                "cannot set a value without a key",
            )),
        }
    }
}

/// Render the stage dump for a plan without materializing it.
///
/// The only command that captures pipeline errors instead of propagating
/// them; the failure text becomes the command's output.
#[derive(Debug)]
struct ExplainEffect {
    state: Arc<SessionState>,
    target: LogicalOperator,
    extended: bool,
}

impl CommandEffect for ExplainEffect {
    fn name(&self) -> &'static str {
        "explain"
    }

    fn run(&self) -> Result<Vec<Row>> {
        let execution = QueryExecution::new(self.state.clone(), self.target.clone());
        let text = execution.explain_string(self.extended);
        Ok(text.lines().map(|line| row![line]).collect())
    }
}

/// Output schema of a resolved plan, a header row then one row per column.
#[derive(Debug)]
struct DescribeEffect {
    schema: Schema,
}

impl CommandEffect for DescribeEffect {
    fn name(&self) -> &'static str {
        "describe"
    }

    fn run(&self) -> Result<Vec<Row>> {
        let mut rows = vec![row!["col_name", "data_type"]];
        rows.extend(self.schema.fields.iter().map(|field| {
            row![
                ScalarValue::Utf8(field.name.clone()),
                ScalarValue::Utf8(field.datatype.to_string())
            ]
        }));
        Ok(rows)
    }
}

/// Materialize a registered table and swap its registration to the cached
/// rows.
#[derive(Debug)]
struct CacheEffect {
    state: Arc<SessionState>,
    table: String,
}

impl CommandEffect for CacheEffect {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn run(&self) -> Result<Vec<Row>> {
        let plan = self.state.catalog.lookup_table(&self.table)?;
        let execution = QueryExecution::new(self.state.clone(), plan);
        let analyzed = execution.analyzed_plan()?;
        let collection = execution.materialize()?;
        self.state
            .catalog
            .swap_in_cached(&self.table, collection, analyzed.output_attrs())?;
        Ok(Vec::new())
    }
}

/// Restore a cached table's original registration.
#[derive(Debug)]
struct UncacheEffect {
    state: Arc<SessionState>,
    table: String,
}

impl CommandEffect for UncacheEffect {
    fn name(&self) -> &'static str {
        "uncache"
    }

    fn run(&self) -> Result<Vec<Row>> {
        self.state.catalog.swap_out_cached(&self.table)?;
        Ok(Vec::new())
    }
}
