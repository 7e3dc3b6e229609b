use riptide_error::{Result, RiptideError};

use super::logical_aggregate::LogicalAggregate;
use super::logical_cache::{LogicalCacheTable, LogicalUncacheTable};
use super::logical_describe::LogicalDescribe;
use super::logical_explain::LogicalExplain;
use super::logical_filter::LogicalFilter;
use super::logical_join::{JoinType, LogicalJoin};
use super::logical_limit::LogicalLimit;
use super::logical_order::{LogicalOrder, SortExpr};
use super::logical_project::LogicalProject;
use super::logical_scan::{LogicalScan, LogicalUnresolvedScan};
use super::logical_set::LogicalSetVar;
use super::logical_setop::{LogicalSetOp, SetOpKind};
use super::logical_single_row::LogicalSingleRow;
use crate::arrays::datatype::DataType;
use crate::expr::aggregate_expr::AggregateExpr;
use crate::expr::attribute::Attribute;
use crate::expr::Expression;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::explain::formatter::ExplainableTree;
use crate::runtime::collection::RowCollection;

/// Wrapper around nodes in the logical plan holding the node's children.
///
/// Node specific state lives in `N`; tree shape lives here.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    pub node: N,
    pub children: Vec<LogicalOperator>,
}

impl<N> Node<N> {
    pub fn into_inner(self) -> N {
        self.node
    }

    pub fn take_one_child_exact(&mut self) -> Result<LogicalOperator> {
        if self.children.len() != 1 {
            return Err(RiptideError::internal(format!(
                "expected 1 child to operator, have {}",
                self.children.len()
            )));
        }
        Ok(self.children.pop().unwrap())
    }

    pub fn take_two_children_exact(&mut self) -> Result<[LogicalOperator; 2]> {
        if self.children.len() != 2 {
            return Err(RiptideError::internal(format!(
                "expected 2 children to operator, have {}",
                self.children.len()
            )));
        }
        let second = self.children.pop().unwrap();
        let first = self.children.pop().unwrap();
        Ok([first, second])
    }

    pub fn get_one_child_exact(&self) -> Result<&LogicalOperator> {
        if self.children.len() != 1 {
            return Err(RiptideError::internal(format!(
                "expected 1 child to operator, have {}",
                self.children.len()
            )));
        }
        Ok(&self.children[0])
    }
}

impl<N> AsRef<N> for Node<N> {
    fn as_ref(&self) -> &N {
        &self.node
    }
}

impl<N> AsMut<N> for Node<N> {
    fn as_mut(&mut self) -> &mut N {
        &mut self.node
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    UnresolvedScan(Node<LogicalUnresolvedScan>),
    Scan(Node<LogicalScan>),
    Project(Node<LogicalProject>),
    Filter(Node<LogicalFilter>),
    Join(Node<LogicalJoin>),
    Aggregate(Node<LogicalAggregate>),
    Order(Node<LogicalOrder>),
    Limit(Node<LogicalLimit>),
    SetOp(Node<LogicalSetOp>),
    SingleRow(Node<LogicalSingleRow>),
    SetVar(Node<LogicalSetVar>),
    Explain(Node<LogicalExplain>),
    Describe(Node<LogicalDescribe>),
    CacheTable(Node<LogicalCacheTable>),
    UncacheTable(Node<LogicalUncacheTable>),
}

impl LogicalOperator {
    pub(crate) const SINGLE_ROW: LogicalOperator = LogicalOperator::SingleRow(Node {
        node: LogicalSingleRow,
        children: Vec::new(),
    });

    /// Take the operator, leaving a placeholder in its place.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::SINGLE_ROW)
    }

    pub fn children(&self) -> &[LogicalOperator] {
        match self {
            Self::UnresolvedScan(n) => &n.children,
            Self::Scan(n) => &n.children,
            Self::Project(n) => &n.children,
            Self::Filter(n) => &n.children,
            Self::Join(n) => &n.children,
            Self::Aggregate(n) => &n.children,
            Self::Order(n) => &n.children,
            Self::Limit(n) => &n.children,
            Self::SetOp(n) => &n.children,
            Self::SingleRow(n) => &n.children,
            Self::SetVar(n) => &n.children,
            Self::Explain(n) => &n.children,
            Self::Describe(n) => &n.children,
            Self::CacheTable(n) => &n.children,
            Self::UncacheTable(n) => &n.children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<LogicalOperator> {
        match self {
            Self::UnresolvedScan(n) => &mut n.children,
            Self::Scan(n) => &mut n.children,
            Self::Project(n) => &mut n.children,
            Self::Filter(n) => &mut n.children,
            Self::Join(n) => &mut n.children,
            Self::Aggregate(n) => &mut n.children,
            Self::Order(n) => &mut n.children,
            Self::Limit(n) => &mut n.children,
            Self::SetOp(n) => &mut n.children,
            Self::SingleRow(n) => &mut n.children,
            Self::SetVar(n) => &mut n.children,
            Self::Explain(n) => &mut n.children,
            Self::Describe(n) => &mut n.children,
            Self::CacheTable(n) => &mut n.children,
            Self::UncacheTable(n) => &mut n.children,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UnresolvedScan(_) => "UnresolvedScan",
            Self::Scan(_) => "Scan",
            Self::Project(_) => "Project",
            Self::Filter(_) => "Filter",
            Self::Join(_) => "Join",
            Self::Aggregate(_) => "Aggregate",
            Self::Order(_) => "Order",
            Self::Limit(_) => "Limit",
            Self::SetOp(_) => "SetOp",
            Self::SingleRow(_) => "SingleRow",
            Self::SetVar(_) => "SetVar",
            Self::Explain(_) => "Explain",
            Self::Describe(_) => "Describe",
            Self::CacheTable(_) => "CacheTable",
            Self::UncacheTable(_) => "UncacheTable",
        }
    }

    /// Whether this operator is a side effecting command.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::SetVar(_)
                | Self::Explain(_)
                | Self::Describe(_)
                | Self::CacheTable(_)
                | Self::UncacheTable(_)
        )
    }

    /// Attributes this operator produces.
    pub fn output_attrs(&self) -> Vec<Attribute> {
        match self {
            Self::UnresolvedScan(_) => Vec::new(),
            Self::Scan(n) => n.node.output_attrs(),
            Self::Project(n) => n.node.output_attrs(),
            Self::Filter(n) => n.children[0].output_attrs(),
            Self::Join(n) => {
                let mut attrs = n.children[0].output_attrs();
                let right = n.children[1].output_attrs();
                match n.node.join_type {
                    // Right side columns of a left join may be padded with
                    // nulls for unmatched rows.
                    JoinType::Left => attrs.extend(right.into_iter().map(|mut attr| {
                        attr.nullable = true;
                        attr
                    })),
                    _ => attrs.extend(right),
                }
                attrs
            }
            Self::Aggregate(n) => n.node.output_attrs(),
            Self::Order(n) => n.children[0].output_attrs(),
            Self::Limit(n) => n.children[0].output_attrs(),
            Self::SetOp(n) => n.children[0].output_attrs(),
            Self::SingleRow(_) => Vec::new(),
            Self::SetVar(n) => n.node.attrs.clone(),
            Self::Explain(n) => n.node.attrs.clone(),
            Self::Describe(n) => n.node.attrs.clone(),
            Self::CacheTable(_) | Self::UncacheTable(_) => Vec::new(),
        }
    }

    /// Replace the children in the operator by running them through `modify`.
    ///
    /// Children will be left in an undetermined state if `modify` errors.
    pub fn modify_replace_children<F>(&mut self, modify: &mut F) -> Result<()>
    where
        F: FnMut(LogicalOperator) -> Result<LogicalOperator>,
    {
        let children = self.children_mut();
        let mut new_children = Vec::with_capacity(children.len());
        for child in children.drain(..) {
            new_children.push(modify(child)?);
        }
        *children = new_children;
        Ok(())
    }

    /// Rewrite the tree bottom-up: children first, then the node itself.
    pub fn transform_up<F>(mut self, f: &mut F) -> Result<LogicalOperator>
    where
        F: FnMut(LogicalOperator) -> Result<LogicalOperator>,
    {
        self.modify_replace_children(&mut |child| child.transform_up(f))?;
        f(self)
    }

    /// Rewrite the tree top-down: the node first, then its children.
    pub fn transform_down<F>(self, f: &mut F) -> Result<LogicalOperator>
    where
        F: FnMut(LogicalOperator) -> Result<LogicalOperator>,
    {
        let mut plan = f(self)?;
        plan.modify_replace_children(&mut |child| child.transform_down(f))?;
        Ok(plan)
    }

    /// Visit every operator in the tree, children before parents.
    pub fn for_each<'a, F>(&'a self, f: &mut F) -> Result<()>
    where
        F: FnMut(&'a LogicalOperator) -> Result<()>,
    {
        for child in self.children() {
            child.for_each(f)?;
        }
        f(self)
    }

    /// Visit the expressions directly held by this operator, not recursing
    /// into children.
    pub fn for_each_expr<'a, F>(&'a self, func: &mut F) -> Result<()>
    where
        F: FnMut(&'a Expression) -> Result<()>,
    {
        match self {
            Self::Project(n) => {
                for expr in &n.node.projections {
                    func(expr)?;
                }
                Ok(())
            }
            Self::Filter(n) => func(&n.node.predicate),
            Self::Join(n) => match &n.node.condition {
                Some(condition) => func(condition),
                None => Ok(()),
            },
            Self::Aggregate(n) => {
                for expr in &n.node.group_exprs {
                    func(expr)?;
                }
                for agg in &n.node.aggregates {
                    func(&agg.input)?;
                }
                Ok(())
            }
            Self::Order(n) => {
                for sort in &n.node.sort_exprs {
                    func(&sort.expr)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        match self {
            Self::Project(n) => {
                for expr in &mut n.node.projections {
                    func(expr)?;
                }
                Ok(())
            }
            Self::Filter(n) => func(&mut n.node.predicate),
            Self::Join(n) => match &mut n.node.condition {
                Some(condition) => func(condition),
                None => Ok(()),
            },
            Self::Aggregate(n) => {
                for expr in &mut n.node.group_exprs {
                    func(expr)?;
                }
                for agg in &mut n.node.aggregates {
                    func(&mut agg.input)?;
                }
                Ok(())
            }
            Self::Order(n) => {
                for sort in &mut n.node.sort_exprs {
                    func(&mut sort.expr)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Whether the plan is fully resolved: no unresolved scans remain and no
    /// expression contains an unresolved column reference.
    pub fn is_resolved(&self) -> bool {
        let mut resolved = true;
        self.for_each(&mut |op| {
            if matches!(op, Self::UnresolvedScan(_)) {
                resolved = false;
            }
            op.for_each_expr(&mut |expr| {
                if expr.contains_unresolved() {
                    resolved = false;
                }
                Ok(())
            })
        })
        .expect("resolution check to not fail");
        resolved
    }
}

/// Mints command output attributes. Called once per constructed command node
/// so repeated `output_attrs` calls agree on attribute ids.
fn command_attrs(fields: &[(&str, DataType)]) -> Vec<Attribute> {
    fields
        .iter()
        .map(|(name, datatype)| Attribute::new(*name, *datatype, false))
        .collect()
}

/// Constructors for building plans without a parser.
impl LogicalOperator {
    pub fn unresolved_scan(table: impl Into<String>) -> Self {
        LogicalOperator::UnresolvedScan(Node {
            node: LogicalUnresolvedScan {
                table: table.into(),
            },
            children: Vec::new(),
        })
    }

    pub fn scan(
        table: Option<String>,
        collection: RowCollection,
        attrs: Vec<Attribute>,
    ) -> Self {
        LogicalOperator::Scan(Node {
            node: LogicalScan {
                table,
                collection,
                attrs,
                projection: None,
            },
            children: Vec::new(),
        })
    }

    pub fn project(child: LogicalOperator, projections: Vec<Expression>) -> Self {
        LogicalOperator::Project(Node {
            node: LogicalProject { projections },
            children: vec![child],
        })
    }

    pub fn filter(child: LogicalOperator, predicate: Expression) -> Self {
        LogicalOperator::Filter(Node {
            node: LogicalFilter { predicate },
            children: vec![child],
        })
    }

    pub fn join(
        left: LogicalOperator,
        right: LogicalOperator,
        join_type: JoinType,
        condition: Option<Expression>,
    ) -> Self {
        LogicalOperator::Join(Node {
            node: LogicalJoin {
                join_type,
                condition,
            },
            children: vec![left, right],
        })
    }

    pub fn aggregate(
        child: LogicalOperator,
        group_exprs: Vec<Expression>,
        aggregates: Vec<AggregateExpr>,
    ) -> Self {
        LogicalOperator::Aggregate(Node {
            node: LogicalAggregate {
                group_exprs,
                aggregates,
            },
            children: vec![child],
        })
    }

    pub fn order(child: LogicalOperator, sort_exprs: Vec<SortExpr>) -> Self {
        LogicalOperator::Order(Node {
            node: LogicalOrder { sort_exprs },
            children: vec![child],
        })
    }

    pub fn limit(child: LogicalOperator, offset: usize, limit: usize) -> Self {
        LogicalOperator::Limit(Node {
            node: LogicalLimit { offset, limit },
            children: vec![child],
        })
    }

    pub fn union(left: LogicalOperator, right: LogicalOperator) -> Self {
        LogicalOperator::SetOp(Node {
            node: LogicalSetOp {
                kind: SetOpKind::Union,
            },
            children: vec![left, right],
        })
    }

    pub fn single_row() -> Self {
        Self::SINGLE_ROW
    }

    pub fn set_var(key: Option<String>, value: Option<String>) -> Self {
        LogicalOperator::SetVar(Node {
            node: LogicalSetVar {
                key,
                value,
                attrs: command_attrs(&[("key", DataType::Utf8), ("value", DataType::Utf8)]),
            },
            children: Vec::new(),
        })
    }

    pub fn explain(target: LogicalOperator, verbose: bool) -> Self {
        LogicalOperator::Explain(Node {
            node: LogicalExplain {
                verbose,
                target: Box::new(target),
                attrs: command_attrs(&[("plan", DataType::Utf8)]),
            },
            children: Vec::new(),
        })
    }

    pub fn describe(child: LogicalOperator) -> Self {
        LogicalOperator::Describe(Node {
            node: LogicalDescribe {
                attrs: command_attrs(&[
                    ("col_name", DataType::Utf8),
                    ("data_type", DataType::Utf8),
                ]),
            },
            children: vec![child],
        })
    }

    pub fn cache_table(table: impl Into<String>) -> Self {
        LogicalOperator::CacheTable(Node {
            node: LogicalCacheTable {
                table: table.into(),
            },
            children: Vec::new(),
        })
    }

    pub fn uncache_table(table: impl Into<String>) -> Self {
        LogicalOperator::UncacheTable(Node {
            node: LogicalUncacheTable {
                table: table.into(),
            },
            children: Vec::new(),
        })
    }
}

impl Explainable for LogicalOperator {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        match self {
            Self::UnresolvedScan(n) => n.node.explain_entry(conf),
            Self::Scan(n) => n.node.explain_entry(conf),
            Self::Project(n) => n.node.explain_entry(conf),
            Self::Filter(n) => n.node.explain_entry(conf),
            Self::Join(n) => n.node.explain_entry(conf),
            Self::Aggregate(n) => n.node.explain_entry(conf),
            Self::Order(n) => n.node.explain_entry(conf),
            Self::Limit(n) => n.node.explain_entry(conf),
            Self::SetOp(n) => n.node.explain_entry(conf),
            Self::SingleRow(n) => n.node.explain_entry(conf),
            Self::SetVar(n) => n.node.explain_entry(conf),
            Self::Explain(n) => n.node.explain_entry(conf),
            Self::Describe(n) => n.node.explain_entry(conf),
            Self::CacheTable(n) => n.node.explain_entry(conf),
            Self::UncacheTable(n) => n.node.explain_entry(conf),
        }
    }
}

impl ExplainableTree for LogicalOperator {
    fn explain_children(&self) -> Vec<&Self> {
        self.children().iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, gt, lit};

    fn test_scan() -> (LogicalOperator, Vec<Attribute>) {
        let attrs = vec![
            Attribute::new("a", DataType::Int64, false),
            Attribute::new("b", DataType::Utf8, true),
        ];
        let scan = LogicalOperator::scan(
            Some("t".to_string()),
            RowCollection::empty(),
            attrs.clone(),
        );
        (scan, attrs)
    }

    #[test]
    fn filter_passes_through_child_attrs() {
        let (scan, attrs) = test_scan();
        let plan = LogicalOperator::filter(scan, gt(col(&attrs[0]), lit(0)));
        assert_eq!(attrs, plan.output_attrs());
    }

    #[test]
    fn left_join_makes_right_side_nullable() {
        let (left, left_attrs) = test_scan();
        let (right, _) = test_scan();
        let plan = LogicalOperator::join(left, right, JoinType::Left, None);

        let attrs = plan.output_attrs();
        assert_eq!(4, attrs.len());
        assert!(!attrs[0].nullable);
        assert_eq!(left_attrs[0].id, attrs[0].id);
        assert!(attrs[2].nullable);
        assert!(attrs[3].nullable);
    }

    #[test]
    fn transform_up_visits_children_first() {
        let (scan, attrs) = test_scan();
        let plan = LogicalOperator::filter(scan, gt(col(&attrs[0]), lit(0)));

        let mut order = Vec::new();
        plan.transform_up(&mut |op| {
            order.push(op.name());
            Ok(op)
        })
        .unwrap();
        assert_eq!(vec!["Scan", "Filter"], order);
    }

    #[test]
    fn command_output_attrs_are_stable() {
        let (scan, _) = test_scan();
        let plan = LogicalOperator::describe(scan);
        assert_eq!(plan.output_attrs(), plan.output_attrs());

        let plan = LogicalOperator::set_var(None, None);
        assert_eq!(plan.output_attrs(), plan.output_attrs());
    }

    #[test]
    fn unresolved_plan_detected() {
        let plan = LogicalOperator::filter(
            LogicalOperator::unresolved_scan("t"),
            gt(crate::expr::col_named("a"), lit(0)),
        );
        assert!(!plan.is_resolved());

        let (scan, attrs) = test_scan();
        let plan = LogicalOperator::filter(scan, gt(col(&attrs[0]), lit(0)));
        assert!(plan.is_resolved());
    }
}
