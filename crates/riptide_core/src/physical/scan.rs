use riptide_error::{Result, RiptideError};

use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::attribute::Attribute;
use crate::runtime::collection::RowCollection;
use crate::runtime::partitioning::Partitioning;

/// Leaf scan over a backing collection, optionally restricted to a subset of
/// columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalScan {
    pub table: Option<String>,
    pub collection: RowCollection,
    pub attrs: Vec<Attribute>,
    pub projection: Option<Vec<usize>>,
}

impl PhysicalScan {
    pub fn output_attrs(&self) -> Vec<Attribute> {
        match &self.projection {
            Some(indices) => indices.iter().map(|&idx| self.attrs[idx].clone()).collect(),
            None => self.attrs.clone(),
        }
    }

    pub fn output_partitioning(&self) -> Partitioning {
        match &self.projection {
            // Restricting columns re-shapes rows, previous layout knowledge
            // only holds if every hash key survives.
            Some(indices) => match self.collection.partitioning() {
                Partitioning::Hash { keys, partitions } => {
                    let kept: Vec<_> = indices.iter().map(|&idx| self.attrs[idx].id).collect();
                    if keys.iter().all(|key| kept.contains(key)) {
                        Partitioning::Hash {
                            keys: keys.clone(),
                            partitions: *partitions,
                        }
                    } else {
                        Partitioning::Unknown {
                            partitions: *partitions,
                        }
                    }
                }
                other => other.clone(),
            },
            None => self.collection.partitioning().clone(),
        }
    }

    pub fn execute(&self) -> Result<RowCollection> {
        match &self.projection {
            Some(indices) => {
                let indices = indices.clone();
                let partitioning = self.output_partitioning();
                let projected = self.collection.map(|row| {
                    let mut columns = Vec::with_capacity(indices.len());
                    for &idx in &indices {
                        let value = row.columns.get(idx).cloned().ok_or_else(|| {
                            RiptideError::internal(format!("row too short for column {idx}"))
                        })?;
                        columns.push(value);
                    }
                    Ok(crate::arrays::row::Row { columns })
                })?;
                Ok(projected.with_partitioning(partitioning))
            }
            None => Ok(self.collection.clone()),
        }
    }
}

impl Explainable for PhysicalScan {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Scan");
        if let Some(table) = &self.table {
            ent = ent.with_value("table", table);
        }
        ent.with_values("columns", self.output_attrs().iter())
    }
}
