use std::fmt;

use serde::{Deserialize, Serialize};

use super::scalar::ScalarValue;

/// Representation of a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub columns: Vec<ScalarValue>,
}

impl Row {
    /// Create an empty row.
    pub const fn empty() -> Self {
        Row {
            columns: Vec::new(),
        }
    }

    pub fn new(columns: Vec<ScalarValue>) -> Self {
        Row { columns }
    }

    /// Return an iterator over all columns in the row.
    pub fn iter(&self) -> impl Iterator<Item = &ScalarValue> {
        self.columns.iter()
    }
}

impl FromIterator<ScalarValue> for Row {
    fn from_iter<T: IntoIterator<Item = ScalarValue>>(iter: T) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, col) in self.columns.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, "]")
    }
}

/// Build a row from anything convertible to scalar values.
#[macro_export]
macro_rules! row {
    ($($val:expr),* $(,)?) => {
        $crate::arrays::row::Row::new(vec![$($crate::arrays::scalar::ScalarValue::from($val)),*])
    };
}
