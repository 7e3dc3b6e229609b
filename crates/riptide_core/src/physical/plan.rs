use riptide_error::Result;

use super::aggregate::PhysicalHashAggregate;
use super::command::PhysicalCommand;
use super::exchange::PhysicalExchange;
use super::filter::PhysicalFilter;
use super::joins::{PhysicalHashJoin, PhysicalNestedLoopJoin};
use super::limit::PhysicalLimit;
use super::project::PhysicalProject;
use super::scan::PhysicalScan;
use super::sort::PhysicalSort;
use super::union::PhysicalUnion;
use super::values::PhysicalValues;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::explain::formatter::ExplainableTree;
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::{Distribution, Partitioning};

#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalPlan {
    Scan(PhysicalScan),
    Project(PhysicalProject),
    Filter(PhysicalFilter),
    HashAggregate(PhysicalHashAggregate),
    Sort(PhysicalSort),
    Limit(PhysicalLimit),
    NestedLoopJoin(PhysicalNestedLoopJoin),
    HashJoin(PhysicalHashJoin),
    Union(PhysicalUnion),
    Exchange(PhysicalExchange),
    Values(PhysicalValues),
    Command(PhysicalCommand),
}

impl PhysicalPlan {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scan(_) => "Scan",
            Self::Project(_) => "Project",
            Self::Filter(_) => "Filter",
            Self::HashAggregate(_) => "HashAggregate",
            Self::Sort(_) => "Sort",
            Self::Limit(_) => "Limit",
            Self::NestedLoopJoin(_) => "NestedLoopJoin",
            Self::HashJoin(_) => "HashJoin",
            Self::Union(_) => "Union",
            Self::Exchange(_) => "Exchange",
            Self::Values(_) => "Values",
            Self::Command(_) => "Command",
        }
    }

    pub fn output_attrs(&self) -> Vec<Attribute> {
        match self {
            Self::Scan(n) => n.output_attrs(),
            Self::Project(n) => n.output_attrs(),
            Self::Filter(n) => n.output_attrs(),
            Self::HashAggregate(n) => n.output_attrs(),
            Self::Sort(n) => n.output_attrs(),
            Self::Limit(n) => n.output_attrs(),
            Self::NestedLoopJoin(n) => n.output_attrs(),
            Self::HashJoin(n) => n.output_attrs(),
            Self::Union(n) => n.output_attrs(),
            Self::Exchange(n) => n.output_attrs(),
            Self::Values(n) => n.output_attrs(),
            Self::Command(n) => n.output_attrs(),
        }
    }

    /// Layout of the rows this operator produces.
    pub fn output_partitioning(&self) -> Partitioning {
        match self {
            Self::Scan(n) => n.output_partitioning(),
            Self::Project(n) => n.output_partitioning(),
            Self::Filter(n) => n.output_partitioning(),
            Self::HashAggregate(n) => n.output_partitioning(),
            Self::Sort(n) => n.output_partitioning(),
            Self::Limit(n) => n.output_partitioning(),
            Self::NestedLoopJoin(n) => n.output_partitioning(),
            Self::HashJoin(n) => n.output_partitioning(),
            Self::Union(n) => n.output_partitioning(),
            Self::Exchange(n) => n.output_partitioning(),
            Self::Values(n) => n.output_partitioning(),
            Self::Command(n) => n.output_partitioning(),
        }
    }

    /// Layout each child must provide before this operator can execute, in
    /// child order.
    pub fn required_child_distributions(&self) -> Vec<Distribution> {
        match self {
            Self::Scan(_) | Self::Values(_) | Self::Command(_) => Vec::new(),
            Self::Project(_) | Self::Filter(_) | Self::Exchange(_) => vec![Distribution::Any],
            Self::HashAggregate(n) => vec![n.required_input_distribution()],
            Self::Sort(_) | Self::Limit(_) => vec![Distribution::Single],
            Self::NestedLoopJoin(n) => n.required_input_distributions().to_vec(),
            Self::HashJoin(n) => n.required_input_distributions().to_vec(),
            Self::Union(_) => vec![Distribution::Any, Distribution::Any],
        }
    }

    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            Self::Scan(_) | Self::Values(_) | Self::Command(_) => Vec::new(),
            Self::Project(n) => vec![n.input.as_ref()],
            Self::Filter(n) => vec![n.input.as_ref()],
            Self::HashAggregate(n) => vec![n.input.as_ref()],
            Self::Sort(n) => vec![n.input.as_ref()],
            Self::Limit(n) => vec![n.input.as_ref()],
            Self::NestedLoopJoin(n) => vec![n.left.as_ref(), n.right.as_ref()],
            Self::HashJoin(n) => vec![n.left.as_ref(), n.right.as_ref()],
            Self::Union(n) => vec![n.left.as_ref(), n.right.as_ref()],
            Self::Exchange(n) => vec![n.input.as_ref()],
        }
    }

    /// Take the plan, leaving an empty values node in its place.
    pub(crate) fn take(&mut self) -> PhysicalPlan {
        std::mem::replace(
            self,
            PhysicalPlan::Values(PhysicalValues {
                attrs: Vec::new(),
                rows: Vec::new(),
            }),
        )
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Box<PhysicalPlan>> {
        match self {
            Self::Scan(_) | Self::Values(_) | Self::Command(_) => Vec::new(),
            Self::Project(n) => vec![&mut n.input],
            Self::Filter(n) => vec![&mut n.input],
            Self::HashAggregate(n) => vec![&mut n.input],
            Self::Sort(n) => vec![&mut n.input],
            Self::Limit(n) => vec![&mut n.input],
            Self::NestedLoopJoin(n) => vec![&mut n.left, &mut n.right],
            Self::HashJoin(n) => vec![&mut n.left, &mut n.right],
            Self::Union(n) => vec![&mut n.left, &mut n.right],
            Self::Exchange(n) => vec![&mut n.input],
        }
    }

    /// Rewrite the tree bottom-up: children first, then the node itself.
    pub fn transform_up<F>(mut self, f: &mut F) -> Result<PhysicalPlan>
    where
        F: FnMut(PhysicalPlan) -> Result<PhysicalPlan>,
    {
        for child in self.children_mut() {
            let taken = child.take();
            **child = taken.transform_up(f)?;
        }
        f(self)
    }

    pub fn for_each<'a, F>(&'a self, f: &mut F) -> Result<()>
    where
        F: FnMut(&'a PhysicalPlan) -> Result<()>,
    {
        for child in self.children() {
            child.for_each(f)?;
        }
        f(self)
    }

    /// Run the operator tree, producing the result collection.
    pub fn execute(&self) -> Result<RowCollection> {
        match self {
            Self::Scan(n) => n.execute(),
            Self::Project(n) => n.execute(),
            Self::Filter(n) => n.execute(),
            Self::HashAggregate(n) => n.execute(),
            Self::Sort(n) => n.execute(),
            Self::Limit(n) => n.execute(),
            Self::NestedLoopJoin(n) => n.execute(),
            Self::HashJoin(n) => n.execute(),
            Self::Union(n) => n.execute(),
            Self::Exchange(n) => n.execute(),
            Self::Values(n) => n.execute(),
            Self::Command(n) => n.execute(),
        }
    }
}

impl Explainable for PhysicalPlan {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let ent = match self {
            Self::Scan(n) => n.explain_entry(conf),
            Self::Project(n) => n.explain_entry(conf),
            Self::Filter(n) => n.explain_entry(conf),
            Self::HashAggregate(n) => n.explain_entry(conf),
            Self::Sort(n) => n.explain_entry(conf),
            Self::Limit(n) => n.explain_entry(conf),
            Self::NestedLoopJoin(n) => n.explain_entry(conf),
            Self::HashJoin(n) => n.explain_entry(conf),
            Self::Union(n) => n.explain_entry(conf),
            Self::Exchange(n) => n.explain_entry(conf),
            Self::Values(n) => n.explain_entry(conf),
            Self::Command(n) => n.explain_entry(conf),
        };
        if conf.verbose {
            ent.with_value("partitioning", self.output_partitioning())
        } else {
            ent
        }
    }
}

impl ExplainableTree for PhysicalPlan {
    fn explain_children(&self) -> Vec<&Self> {
        self.children()
    }
}
