use std::fmt;

use super::attribute::{Attribute, AttributeId};
use super::Expression;
use crate::arrays::datatype::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Sum => write!(f, "sum"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
            Self::Avg => write!(f, "avg"),
        }
    }
}

/// An aggregate over an input expression.
///
/// Aggregates live directly on the Aggregate operator, never nested inside
/// scalar expressions. Like Alias, this carries its own attribute id so the
/// derived output attribute is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub id: AttributeId,
    pub name: String,
    pub func: AggregateFunction,
    pub input: Expression,
}

impl AggregateExpr {
    pub fn new(func: AggregateFunction, input: Expression) -> Self {
        let name = format!("{}({})", func, input.output_name());
        AggregateExpr {
            id: AttributeId::next(),
            name,
            func,
            input,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn output_attr(&self) -> Attribute {
        let datatype = match self.func {
            AggregateFunction::Count => DataType::Int64,
            AggregateFunction::Avg => DataType::Float64,
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                self.input.datatype()
            }
        };
        Attribute {
            id: self.id,
            name: self.name.clone(),
            datatype,
            // Every aggregate except count produces NULL for empty groups.
            nullable: !matches!(self.func, AggregateFunction::Count),
        }
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.func, self.input)
    }
}
