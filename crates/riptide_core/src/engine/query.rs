use std::sync::Arc;

use parking_lot::Mutex;
use riptide_error::Result;
use tracing::debug;
use uuid::Uuid;

use super::commands::CommandStrategy;
use super::session::SessionState;
use crate::analyzer::Analyzer;
use crate::arrays::datatype::Schema;
use crate::arrays::row::Row;
use crate::explain::explainable::ExplainConfig;
use crate::explain::formatter::{format_tree, format_tree_json};
use crate::logical::operator::LogicalOperator;
use crate::optimizer::Optimizer;
use crate::physical::distribution::EnsureDistribution;
use crate::physical::plan::PhysicalPlan;
use crate::physical::planner::QueryPlanner;
use crate::rules::{Batch, RuleExecutor};
use crate::runtime::collection::RowCollection;

/// One submitted query and its derived stages.
///
/// Each stage is computed at most once and cached for the life of the
/// object. The per-stage mutexes make memoization atomic: a concurrent
/// reader sees a stage fully computed or not started, never in between.
#[derive(Debug)]
pub struct QueryExecution {
    id: Uuid,
    logical: LogicalOperator,
    state: Arc<SessionState>,
    analyzed: Mutex<Option<LogicalOperator>>,
    optimized: Mutex<Option<LogicalOperator>>,
    physical: Mutex<Option<PhysicalPlan>>,
    executable: Mutex<Option<PhysicalPlan>>,
    result: Mutex<Option<RowCollection>>,
}

impl QueryExecution {
    pub(crate) fn new(state: Arc<SessionState>, logical: LogicalOperator) -> Self {
        QueryExecution {
            id: Uuid::new_v4(),
            logical,
            state,
            analyzed: Mutex::new(None),
            optimized: Mutex::new(None),
            physical: Mutex::new(None),
            executable: Mutex::new(None),
            result: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The plan as submitted.
    pub fn logical_plan(&self) -> &LogicalOperator {
        &self.logical
    }

    fn rule_executor(&self) -> RuleExecutor {
        RuleExecutor::new(self.state.vars.fail_on_non_convergence())
    }

    pub fn analyzed_plan(&self) -> Result<LogicalOperator> {
        let mut cell = self.analyzed.lock();
        if let Some(plan) = cell.as_ref() {
            return Ok(plan.clone());
        }
        let analyzer = Analyzer::new(self.state.catalog.clone(), self.rule_executor());
        let plan = analyzer.resolve(self.logical.clone())?;
        *cell = Some(plan.clone());
        Ok(plan)
    }

    /// Output schema of the resolved plan.
    pub fn output_schema(&self) -> Result<Schema> {
        let analyzed = self.analyzed_plan()?;
        Ok(Schema::new(
            analyzed.output_attrs().iter().map(|attr| attr.to_field()),
        ))
    }

    pub fn optimized_plan(&self) -> Result<LogicalOperator> {
        let analyzed = self.analyzed_plan()?;
        let mut cell = self.optimized.lock();
        if let Some(plan) = cell.as_ref() {
            return Ok(plan.clone());
        }
        let plan = Optimizer::new(self.rule_executor()).optimize(analyzed)?;
        *cell = Some(plan.clone());
        Ok(plan)
    }

    pub fn physical_plan(&self) -> Result<PhysicalPlan> {
        let optimized = self.optimized_plan()?;
        let mut cell = self.physical.lock();
        if let Some(plan) = cell.as_ref() {
            return Ok(plan.clone());
        }
        let planner = QueryPlanner::with_default_strategies(vec![Box::new(CommandStrategy {
            state: self.state.clone(),
        })]);
        let plan = planner.plan(&optimized)?;
        *cell = Some(plan.clone());
        Ok(plan)
    }

    /// The physical plan with redistribution boundaries inserted.
    ///
    /// The boundary pass runs exactly once per execution; the raw physical
    /// stage is never rewritten in place.
    pub fn executed_plan(&self) -> Result<PhysicalPlan> {
        let physical = self.physical_plan()?;
        let mut cell = self.executable.lock();
        if let Some(plan) = cell.as_ref() {
            return Ok(plan.clone());
        }
        let batch: Batch<PhysicalPlan> = Batch::once(
            "redistribution",
            vec![Box::new(EnsureDistribution {
                shuffle_partitions: self.state.vars.shuffle_partitions(),
            })],
        );
        let plan = self
            .rule_executor()
            .run_batches(physical, std::slice::from_ref(&batch))?;
        *cell = Some(plan.clone());
        debug!(id = %self.id, "executable plan ready");
        Ok(plan)
    }

    /// Run the query, memoizing the result collection.
    pub fn materialize(&self) -> Result<RowCollection> {
        let executable = self.executed_plan()?;
        let mut cell = self.result.lock();
        if let Some(collection) = cell.as_ref() {
            return Ok(collection.clone());
        }
        let collection = executable.execute()?;
        *cell = Some(collection.clone());
        Ok(collection)
    }

    pub fn collect(&self) -> Result<Vec<Row>> {
        Ok(self.materialize()?.collect())
    }

    /// Diagnostic rendering of the stages.
    ///
    /// Extended output shows every stage; brief output only the executable
    /// plan. Stage failures render as text, inspection never propagates
    /// errors.
    pub fn explain_string(&self, extended: bool) -> String {
        let conf = if extended {
            ExplainConfig::VERBOSE
        } else {
            ExplainConfig::default()
        };

        let mut out = String::new();
        if extended {
            push_stage(&mut out, "Logical Plan", Ok(format_tree(&self.logical, conf)));
            push_stage(
                &mut out,
                "Analyzed Plan",
                self.analyzed_plan().map(|p| format_tree(&p, conf)),
            );
            push_stage(
                &mut out,
                "Optimized Plan",
                self.optimized_plan().map(|p| format_tree(&p, conf)),
            );
            push_stage(
                &mut out,
                "Physical Plan",
                self.physical_plan().map(|p| format_tree(&p, conf)),
            );
        }
        push_stage(
            &mut out,
            "Executable Plan",
            self.executed_plan().map(|p| format_tree(&p, conf)),
        );
        out
    }

    /// The executable plan rendered as JSON, for machine consumers.
    pub fn explain_json(&self) -> Result<String> {
        let plan = self.executed_plan()?;
        format_tree_json(&plan, ExplainConfig::VERBOSE)
    }
}

fn push_stage(out: &mut String, title: &str, rendered: Result<String>) {
    out.push_str("== ");
    out.push_str(title);
    out.push_str(" ==\n");
    match rendered {
        Ok(text) => out.push_str(&text),
        Err(err) => {
            out.push_str("error: ");
            out.push_str(&err.to_string());
            out.push('\n');
        }
    }
}
