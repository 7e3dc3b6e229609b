use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::arrays::datatype::{DataType, Field};

static NEXT_ATTRIBUTE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an attribute.
///
/// Two attributes with the same display name but different lineage get
/// different ids and are never conflated. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(u64);

impl AttributeId {
    pub fn next() -> Self {
        AttributeId(NEXT_ATTRIBUTE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed, nullable, identity-bearing column produced by an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl Attribute {
    /// Create a new attribute with a fresh id.
    pub fn new(name: impl Into<String>, datatype: DataType, nullable: bool) -> Self {
        Attribute {
            id: AttributeId::next(),
            name: name.into(),
            datatype,
            nullable,
        }
    }

    pub fn to_field(&self) -> Field {
        Field::new(self.name.clone(), self.datatype, self.nullable)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_distinct_identity() {
        let a = Attribute::new("a", DataType::Int64, false);
        let b = Attribute::new("a", DataType::Int64, false);
        assert_ne!(a.id, b.id);
    }
}
