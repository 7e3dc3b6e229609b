use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use riptide_error::{Result, RiptideError};
use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// A single owned value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Null => DataType::Unknown,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(RiptideError::internal(format!(
                "expected boolean, got {other}"
            ))),
        }
    }

    /// Total ordering used by sort and comparison operators.
    ///
    /// Nulls sort first. Int64 and Float64 compare numerically against each
    /// other; values of unrelated types compare by type tag so the ordering
    /// stays total.
    pub fn total_cmp(&self, other: &ScalarValue) -> Ordering {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Int64(a), Int64(b)) => a.cmp(b),
            (Float64(a), Float64(b)) => a.total_cmp(b),
            (Int64(a), Float64(b)) => (*a as f64).total_cmp(b),
            (Float64(a), Int64(b)) => a.total_cmp(&(*b as f64)),
            (Utf8(a), Utf8(b)) => a.cmp(b),
            (a, b) => type_tag(a).cmp(&type_tag(b)),
        }
    }
}

fn type_tag(v: &ScalarValue) -> u8 {
    match v {
        ScalarValue::Null => 0,
        ScalarValue::Boolean(_) => 1,
        ScalarValue::Int64(_) => 2,
        ScalarValue::Float64(_) => 3,
        ScalarValue::Utf8(_) => 4,
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Boolean(b) => b.hash(state),
            // Int64 and Float64 must hash alike when they compare equal.
            Self::Int64(v) => (*v as f64).to_bits().hash(state),
            Self::Float64(v) => v.to_bits().hash(state),
            Self::Utf8(s) => s.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        Self::Int64(v as i64)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_float_compare_equal() {
        assert_eq!(ScalarValue::Int64(3), ScalarValue::Float64(3.0));
        assert_eq!(
            Ordering::Less,
            ScalarValue::Int64(3).total_cmp(&ScalarValue::Float64(3.5))
        );
    }

    #[test]
    fn nulls_sort_first() {
        assert_eq!(
            Ordering::Less,
            ScalarValue::Null.total_cmp(&ScalarValue::Int64(i64::MIN))
        );
    }
}
