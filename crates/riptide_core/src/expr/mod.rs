pub mod aggregate_expr;
pub mod alias_expr;
pub mod arith_expr;
pub mod attribute;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod evaluate;
pub mod literal_expr;
pub mod negate_expr;

use std::collections::HashSet;
use std::fmt;

use riptide_error::Result;

use self::alias_expr::AliasExpr;
use self::arith_expr::{ArithExpr, ArithOperator};
use self::attribute::{Attribute, AttributeId};
use self::column_expr::{ColumnExpr, UnresolvedColumnExpr};
use self::comparison_expr::{ComparisonExpr, ComparisonOperator};
use self::conjunction_expr::{ConjunctionExpr, ConjunctionOperator};
use self::literal_expr::LiteralExpr;
use self::negate_expr::NegateExpr;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;

/// A scalar expression in a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnExpr),
    Unresolved(UnresolvedColumnExpr),
    Literal(LiteralExpr),
    Arith(ArithExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
    Negate(NegateExpr),
    Alias(AliasExpr),
}

impl Expression {
    /// Output type of the expression.
    ///
    /// Returns `Unknown` while the expression still contains unresolved
    /// column references.
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Column(col) => col.attr.datatype,
            Self::Unresolved(_) => DataType::Unknown,
            Self::Literal(lit) => lit.literal.datatype(),
            Self::Arith(arith) => {
                let left = arith.left.datatype();
                let right = arith.right.datatype();
                if left == DataType::Unknown || right == DataType::Unknown {
                    DataType::Unknown
                } else if left == DataType::Float64 || right == DataType::Float64 {
                    DataType::Float64
                } else {
                    DataType::Int64
                }
            }
            Self::Comparison(_) | Self::Conjunction(_) | Self::Negate(_) => DataType::Boolean,
            Self::Alias(alias) => alias.expr.datatype(),
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Self::Column(col) => col.attr.nullable,
            Self::Unresolved(_) => true,
            Self::Literal(lit) => lit.literal.is_null(),
            Self::Arith(arith) => arith.left.nullable() || arith.right.nullable(),
            Self::Comparison(cmp) => cmp.left.nullable() || cmp.right.nullable(),
            Self::Conjunction(conj) => conj.expressions.iter().any(|e| e.nullable()),
            Self::Negate(neg) => neg.expr.nullable(),
            Self::Alias(alias) => alias.expr.nullable(),
        }
    }

    /// Display name this expression gets when used as a projection item.
    pub fn output_name(&self) -> String {
        match self {
            Self::Column(col) => col.attr.name.clone(),
            Self::Unresolved(col) => col.name.clone(),
            Self::Alias(alias) => alias.name.clone(),
            other => other.to_string(),
        }
    }

    /// Attribute this expression produces when used as a projection item.
    ///
    /// Stable only for Column and Alias expressions. The analyzer wraps every
    /// other top level projection expression in an Alias, so resolved plans
    /// never derive attributes from the fallback arm.
    pub fn output_attr(&self) -> Attribute {
        match self {
            Self::Column(col) => col.attr.clone(),
            Self::Alias(alias) => Attribute {
                id: alias.id,
                name: alias.name.clone(),
                datatype: alias.expr.datatype(),
                nullable: alias.expr.nullable(),
            },
            other => Attribute::new(other.output_name(), other.datatype(), other.nullable()),
        }
    }

    pub fn for_each_child<'a, F>(&'a self, func: &mut F) -> Result<()>
    where
        F: FnMut(&'a Expression) -> Result<()>,
    {
        match self {
            Self::Column(_) | Self::Unresolved(_) | Self::Literal(_) => Ok(()),
            Self::Arith(arith) => {
                func(&arith.left)?;
                func(&arith.right)
            }
            Self::Comparison(cmp) => {
                func(&cmp.left)?;
                func(&cmp.right)
            }
            Self::Conjunction(conj) => {
                for expr in &conj.expressions {
                    func(expr)?;
                }
                Ok(())
            }
            Self::Negate(neg) => func(&neg.expr),
            Self::Alias(alias) => func(&alias.expr),
        }
    }

    pub fn for_each_child_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        match self {
            Self::Column(_) | Self::Unresolved(_) | Self::Literal(_) => Ok(()),
            Self::Arith(arith) => {
                func(&mut arith.left)?;
                func(&mut arith.right)
            }
            Self::Comparison(cmp) => {
                func(&mut cmp.left)?;
                func(&mut cmp.right)
            }
            Self::Conjunction(conj) => {
                for expr in &mut conj.expressions {
                    func(expr)?;
                }
                Ok(())
            }
            Self::Negate(neg) => func(&mut neg.expr),
            Self::Alias(alias) => func(&mut alias.expr),
        }
    }

    /// Whether any unresolved column references remain in the tree.
    pub fn contains_unresolved(&self) -> bool {
        if matches!(self, Self::Unresolved(_)) {
            return true;
        }
        let mut found = false;
        self.for_each_child(&mut |child| {
            found = found || child.contains_unresolved();
            Ok(())
        })
        .expect("unresolved check to not fail");
        found
    }

    /// Whether this expression can be evaluated without any input row.
    pub fn is_const_foldable(&self) -> bool {
        if matches!(self, Self::Column(_) | Self::Unresolved(_)) {
            return false;
        }
        let mut foldable = true;
        self.for_each_child(&mut |child| {
            foldable = foldable && child.is_const_foldable();
            Ok(())
        })
        .expect("foldable check to not fail");
        foldable
    }

    /// Collect ids of all resolved column references in the tree.
    pub fn collect_column_ids(&self, out: &mut HashSet<AttributeId>) {
        if let Self::Column(col) = self {
            out.insert(col.attr.id);
        }
        self.for_each_child(&mut |child| {
            child.collect_column_ids(out);
            Ok(())
        })
        .expect("column collection to not fail");
    }

    /// Collect all resolved column references in the tree.
    pub fn collect_column_refs(&self, out: &mut Vec<Attribute>) {
        if let Self::Column(col) = self {
            if !out.iter().any(|a| a.id == col.attr.id) {
                out.push(col.attr.clone());
            }
        }
        self.for_each_child(&mut |child| {
            child.collect_column_refs(out);
            Ok(())
        })
        .expect("column collection to not fail");
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(e) => write!(f, "{e}"),
            Self::Unresolved(e) => write!(f, "{e}"),
            Self::Literal(e) => write!(f, "{e}"),
            Self::Arith(e) => write!(f, "{e}"),
            Self::Comparison(e) => write!(f, "{e}"),
            Self::Conjunction(e) => write!(f, "{e}"),
            Self::Negate(e) => write!(f, "{e}"),
            Self::Alias(e) => write!(f, "{e}"),
        }
    }
}

pub fn lit(value: impl Into<ScalarValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        literal: value.into(),
    })
}

pub fn col(attr: &Attribute) -> Expression {
    Expression::Column(ColumnExpr { attr: attr.clone() })
}

pub fn col_named(name: impl Into<String>) -> Expression {
    Expression::Unresolved(UnresolvedColumnExpr { name: name.into() })
}

pub fn alias(expr: Expression, name: impl Into<String>) -> Expression {
    Expression::Alias(AliasExpr {
        id: AttributeId::next(),
        name: name.into(),
        expr: Box::new(expr),
    })
}

fn arith(op: ArithOperator, left: Expression, right: Expression) -> Expression {
    Expression::Arith(ArithExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn add(left: Expression, right: Expression) -> Expression {
    arith(ArithOperator::Add, left, right)
}

pub fn sub(left: Expression, right: Expression) -> Expression {
    arith(ArithOperator::Sub, left, right)
}

pub fn mul(left: Expression, right: Expression) -> Expression {
    arith(ArithOperator::Mul, left, right)
}

pub fn div(left: Expression, right: Expression) -> Expression {
    arith(ArithOperator::Div, left, right)
}

fn comparison(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    Expression::Comparison(ComparisonExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    comparison(ComparisonOperator::Eq, left, right)
}

pub fn not_eq(left: Expression, right: Expression) -> Expression {
    comparison(ComparisonOperator::NotEq, left, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    comparison(ComparisonOperator::Lt, left, right)
}

pub fn lt_eq(left: Expression, right: Expression) -> Expression {
    comparison(ComparisonOperator::LtEq, left, right)
}

pub fn gt(left: Expression, right: Expression) -> Expression {
    comparison(ComparisonOperator::Gt, left, right)
}

pub fn gt_eq(left: Expression, right: Expression) -> Expression {
    comparison(ComparisonOperator::GtEq, left, right)
}

pub fn not(expr: Expression) -> Expression {
    Expression::Negate(NegateExpr {
        expr: Box::new(expr),
    })
}

fn conjunction(
    op: ConjunctionOperator,
    exprs: impl IntoIterator<Item = Expression>,
) -> Option<Expression> {
    let mut exprs: Vec<_> = exprs.into_iter().collect();
    match exprs.len() {
        0 => None,
        1 => Some(exprs.pop().unwrap()),
        _ => Some(Expression::Conjunction(ConjunctionExpr {
            op,
            expressions: exprs,
        })),
    }
}

/// AND all expressions together, or None for an empty input.
pub fn and_all(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    conjunction(ConjunctionOperator::And, exprs)
}

/// OR all expressions together, or None for an empty input.
pub fn or_all(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    conjunction(ConjunctionOperator::Or, exprs)
}

/// Split an expression on AND, pushing the conjuncts into `out`.
pub fn split_conjunction(expr: Expression, out: &mut Vec<Expression>) {
    match expr {
        Expression::Conjunction(conj) if conj.op == ConjunctionOperator::And => {
            for child in conj.expressions {
                split_conjunction(child, out);
            }
        }
        other => out.push(other),
    }
}
