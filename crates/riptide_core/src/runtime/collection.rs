//! In-process stand-in for the distributed collection substrate.
//!
//! The planner only consumes the operations here (map, filter, partition
//! local transforms, repartitioning, collect) and treats the collection as an
//! opaque, potentially parallel executor. Swapping in a real distributed
//! backend would not change any planning code.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use riptide_error::{Result, RiptideError};

use super::partitioning::Partitioning;
use crate::arrays::row::Row;

/// A partitioned collection of rows.
///
/// Cheap to clone; partitions are shared behind an `Arc`. All transforms
/// produce new collections, the input is never mutated.
#[derive(Debug, Clone)]
pub struct RowCollection {
    partitions: Arc<Vec<Vec<Row>>>,
    partitioning: Partitioning,
    persisted: bool,
}

/// Equality is identity of the backing partitions.
///
/// Plan trees embed collections at scan leaves, and the rule engine compares
/// trees structurally to detect fixed points. Two scans over the same backing
/// data compare equal without walking the rows.
impl PartialEq for RowCollection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.partitions, &other.partitions)
            && self.partitioning == other.partitioning
    }
}

impl RowCollection {
    pub fn empty() -> Self {
        RowCollection {
            partitions: Arc::new(vec![Vec::new()]),
            partitioning: Partitioning::Single,
            persisted: false,
        }
    }

    /// Create a collection from rows, spread round-robin over `partitions`.
    pub fn from_rows(rows: Vec<Row>, partitions: usize) -> Self {
        let partitions = partitions.max(1);
        if partitions == 1 {
            return Self::single(rows);
        }
        let mut parts: Vec<Vec<Row>> = (0..partitions).map(|_| Vec::new()).collect();
        for (idx, row) in rows.into_iter().enumerate() {
            parts[idx % partitions].push(row);
        }
        RowCollection {
            partitions: Arc::new(parts),
            partitioning: Partitioning::Unknown { partitions },
            persisted: false,
        }
    }

    /// Create a single-partition collection.
    pub fn single(rows: Vec<Row>) -> Self {
        RowCollection {
            partitions: Arc::new(vec![rows]),
            partitioning: Partitioning::Single,
            persisted: false,
        }
    }

    pub fn partitioning(&self) -> &Partitioning {
        &self.partitioning
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.len()).sum()
    }

    /// Override the partitioning descriptor.
    ///
    /// Operators that know they preserve a layout (e.g. a projection keeping
    /// the hash keys) use this to keep the descriptor accurate.
    pub fn with_partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    /// Partition-local row transform.
    pub fn map<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&Row) -> Result<Row>,
    {
        let parts = self
            .partitions
            .iter()
            .map(|part| part.iter().map(&f).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Ok(RowCollection {
            partitions: Arc::new(parts),
            // Row shape may have changed, any previous layout knowledge is
            // gone unless the caller restores it.
            partitioning: Partitioning::Unknown {
                partitions: self.partitions.len(),
            },
            persisted: false,
        })
    }

    /// Partition-local row filter. Keeps the partitioning descriptor, a
    /// filter never moves rows between partitions.
    pub fn filter<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&Row) -> Result<bool>,
    {
        let parts = self
            .partitions
            .iter()
            .map(|part| {
                let mut out = Vec::new();
                for row in part {
                    if f(row)? {
                        out.push(row.clone());
                    }
                }
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RowCollection {
            partitions: Arc::new(parts),
            partitioning: self.partitioning.clone(),
            persisted: false,
        })
    }

    /// Transform each partition as a whole.
    pub fn map_partitions<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&[Row]) -> Result<Vec<Row>>,
    {
        let parts = self
            .partitions
            .iter()
            .map(|part| f(part))
            .collect::<Result<Vec<_>>>()?;
        Ok(RowCollection {
            partitions: Arc::new(parts),
            partitioning: Partitioning::Unknown {
                partitions: self.partitions.len(),
            },
            persisted: false,
        })
    }

    /// Pairwise transform over the partitions of two collections with the
    /// same partition count.
    pub fn zip_partitions<F>(&self, other: &Self, f: F) -> Result<Self>
    where
        F: Fn(&[Row], &[Row]) -> Result<Vec<Row>>,
    {
        if self.partitions.len() != other.partitions.len() {
            return Err(RiptideError::internal(format!(
                "partition count mismatch: {} vs {}",
                self.partitions.len(),
                other.partitions.len()
            )));
        }
        let parts = self
            .partitions
            .iter()
            .zip(other.partitions.iter())
            .map(|(a, b)| f(a, b))
            .collect::<Result<Vec<_>>>()?;
        Ok(RowCollection {
            partitions: Arc::new(parts),
            partitioning: Partitioning::Unknown {
                partitions: self.partitions.len(),
            },
            persisted: false,
        })
    }

    /// Redistribute rows by hashing the values at `key_indices`.
    pub fn repartition_hash(&self, key_indices: &[usize], partitions: usize) -> Self {
        let partitions = partitions.max(1);
        let mut parts: Vec<Vec<Row>> = (0..partitions).map(|_| Vec::new()).collect();
        for part in self.partitions.iter() {
            for row in part {
                let mut hasher = DefaultHasher::new();
                for &idx in key_indices {
                    if let Some(value) = row.columns.get(idx) {
                        value.hash(&mut hasher);
                    }
                }
                let target = (hasher.finish() as usize) % partitions;
                parts[target].push(row.clone());
            }
        }
        RowCollection {
            partitions: Arc::new(parts),
            partitioning: Partitioning::Unknown { partitions },
            persisted: false,
        }
    }

    /// Move all rows into a single partition, preserving partition order.
    pub fn coalesce_single(&self) -> Self {
        Self::single(self.collect())
    }

    /// Mark the collection as held in memory.
    pub fn persist(mut self) -> Self {
        self.persisted = true;
        self
    }

    pub fn unpersist(mut self) -> Self {
        self.persisted = false;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Eagerly materialize all rows in partition order.
    pub fn collect(&self) -> Vec<Row> {
        self.partitions.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn round_robin_distribution() {
        let rows = vec![row![1], row![2], row![3], row![4], row![5]];
        let coll = RowCollection::from_rows(rows.clone(), 2);
        assert_eq!(2, coll.num_partitions());
        assert_eq!(5, coll.num_rows());

        let mut collected = coll.collect();
        collected.sort_by(|a, b| a.columns[0].total_cmp(&b.columns[0]));
        assert_eq!(rows, collected);
    }

    #[test]
    fn hash_repartition_colocates_equal_keys() {
        let rows = vec![row![1, "a"], row![2, "b"], row![1, "c"], row![2, "d"]];
        let coll = RowCollection::from_rows(rows, 3).repartition_hash(&[0], 2);

        for part_idx in 0..coll.num_partitions() {
            let keys: Vec<_> = coll.partitions[part_idx]
                .iter()
                .map(|r| r.columns[0].clone())
                .collect();
            // All rows with the same key must be in the same partition, so a
            // key seen here must not appear in the other partition.
            let other = &coll.partitions[1 - part_idx];
            for key in keys {
                assert!(other.iter().all(|r| r.columns[0] != key));
            }
        }
    }

    #[test]
    fn structural_equality_is_identity() {
        let a = RowCollection::from_rows(vec![row![1]], 1);
        let b = a.clone();
        let c = RowCollection::from_rows(vec![row![1]], 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn persist_marker_toggles() {
        let coll = RowCollection::from_rows(vec![row![1]], 1);
        assert!(!coll.is_persisted());
        let coll = coll.persist();
        assert!(coll.is_persisted());
        let coll = coll.unpersist();
        assert!(!coll.is_persisted());
    }

    #[test]
    fn coalesce_single_preserves_order_within_partitions() {
        let coll = RowCollection::from_rows(vec![row![1], row![2], row![3], row![4]], 2);
        let single = coll.coalesce_single();
        assert_eq!(1, single.num_partitions());
        assert_eq!(4, single.num_rows());
        assert_eq!(Partitioning::Single, *single.partitioning());
    }
}
