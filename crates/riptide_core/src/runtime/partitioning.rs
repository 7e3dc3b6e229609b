use std::fmt;

use crate::expr::attribute::AttributeId;

/// How the rows of a collection are laid out across partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partitioning {
    /// Rows spread across partitions with no known property.
    Unknown { partitions: usize },
    /// All rows in a single partition.
    Single,
    /// Rows distributed by a hash of the listed attributes. Rows that agree
    /// on the key attributes land in the same partition.
    Hash {
        keys: Vec<AttributeId>,
        partitions: usize,
    },
}

impl Partitioning {
    pub fn partition_count(&self) -> usize {
        match self {
            Self::Unknown { partitions } => *partitions,
            Self::Single => 1,
            Self::Hash { partitions, .. } => *partitions,
        }
    }

    /// Whether data laid out this way satisfies a required distribution.
    pub fn satisfies(&self, required: &Distribution) -> bool {
        match required {
            Distribution::Any => true,
            // A single partition trivially colocates everything.
            Distribution::Single => matches!(self, Self::Single) || self.partition_count() == 1,
            Distribution::Hash { keys } => match self {
                Self::Single => true,
                Self::Hash { keys: own, .. } => own == keys,
                Self::Unknown { .. } => false,
            },
        }
    }
}

impl fmt::Display for Partitioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { partitions } => write!(f, "unknown({partitions})"),
            Self::Single => write!(f, "single"),
            Self::Hash { keys, partitions } => {
                write!(f, "hash(")?;
                for (idx, key) in keys.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}")?;
                }
                write!(f, "; {partitions})")
            }
        }
    }
}

/// Input layout an operator requires from a child before it can execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    Any,
    Single,
    Hash { keys: Vec<AttributeId> },
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Single => write!(f, "single"),
            Self::Hash { keys } => {
                write!(f, "hash(")?;
                for (idx, key) in keys.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}")?;
                }
                write!(f, ")")
            }
        }
    }
}
