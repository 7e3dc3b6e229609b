//! Session scoped table registry.

use std::collections::HashMap;

use parking_lot::RwLock;
use riptide_error::{Result, RiptideError};
use tracing::debug;

use crate::expr::attribute::Attribute;
use crate::logical::operator::LogicalOperator;
use crate::runtime::collection::RowCollection;

/// Maps names to logical plans for one session.
///
/// Registrations are visible to every lookup in the same session; sessions
/// never share a catalog.
#[derive(Debug)]
pub struct SessionCatalog {
    case_sensitive: bool,
    inner: RwLock<CatalogInner>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    tables: HashMap<String, LogicalOperator>,
    /// Original registrations of tables currently swapped to a cached scan.
    cached: HashMap<String, LogicalOperator>,
}

impl SessionCatalog {
    pub fn new(case_sensitive: bool) -> Self {
        SessionCatalog {
            case_sensitive,
            inner: RwLock::new(CatalogInner::default()),
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn normalize(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Register a plan under a name. Re-registering overwrites.
    pub fn register_table(&self, name: &str, plan: LogicalOperator) {
        let name = self.normalize(name);
        debug!(%name, "registering table");
        let mut inner = self.inner.write();
        inner.cached.remove(&name);
        inner.tables.insert(name, plan);
    }

    /// Look up the plan registered under a name.
    pub fn lookup_table(&self, name: &str) -> Result<LogicalOperator> {
        let normalized = self.normalize(name);
        let inner = self.inner.read();
        inner.tables.get(&normalized).cloned().ok_or_else(|| {
            RiptideError::resolution(format!("table '{name}' is not registered"), normalized)
        })
    }

    pub fn unregister_table(&self, name: &str) -> Result<()> {
        let normalized = self.normalize(name);
        let mut inner = self.inner.write();
        inner.cached.remove(&normalized);
        if inner.tables.remove(&normalized).is_none() {
            return Err(RiptideError::invalid_argument(format!(
                "table '{name}' is not registered"
            )));
        }
        Ok(())
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.inner.read().tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Swap the named table's registration to a scan over materialized rows.
    ///
    /// The caller materializes; the catalog only performs the swap. Caching
    /// an already cached table replaces the snapshot but keeps the original
    /// registration for a later uncache.
    pub fn swap_in_cached(
        &self,
        name: &str,
        collection: RowCollection,
        attrs: Vec<Attribute>,
    ) -> Result<()> {
        let normalized = self.normalize(name);
        let mut inner = self.inner.write();
        let original = inner.tables.get(&normalized).cloned().ok_or_else(|| {
            RiptideError::invalid_argument(format!("cannot cache unregistered table '{name}'"))
        })?;

        inner
            .cached
            .entry(normalized.clone())
            .or_insert(original);
        inner.tables.insert(
            normalized.clone(),
            LogicalOperator::scan(Some(normalized), collection.persist(), attrs),
        );
        Ok(())
    }

    /// Restore the named table's original registration, releasing the cached
    /// rows.
    pub fn swap_out_cached(&self, name: &str) -> Result<()> {
        let normalized = self.normalize(name);
        let mut inner = self.inner.write();
        let original = inner.cached.remove(&normalized).ok_or_else(|| {
            RiptideError::invalid_argument(format!("table '{name}' is not cached"))
        })?;
        inner.tables.insert(normalized, original);
        Ok(())
    }

    pub fn is_cached(&self, name: &str) -> bool {
        let normalized = self.normalize(name);
        self.inner.read().cached.contains_key(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;

    fn scan_plan(table: &str) -> LogicalOperator {
        LogicalOperator::scan(
            Some(table.to_string()),
            RowCollection::empty(),
            vec![Attribute::new("a", DataType::Int64, false)],
        )
    }

    #[test]
    fn register_and_lookup() {
        let catalog = SessionCatalog::new(false);
        catalog.register_table("t", scan_plan("t"));
        catalog.lookup_table("t").unwrap();
        // Case insensitive by default.
        catalog.lookup_table("T").unwrap();
    }

    #[test]
    fn lookup_missing_is_resolution_error() {
        let catalog = SessionCatalog::new(false);
        let err = catalog.lookup_table("nope").unwrap_err();
        assert!(matches!(err, RiptideError::Resolution { .. }));
    }

    #[test]
    fn case_sensitive_lookup() {
        let catalog = SessionCatalog::new(true);
        catalog.register_table("Orders", scan_plan("Orders"));
        catalog.lookup_table("Orders").unwrap();
        assert!(catalog.lookup_table("orders").is_err());
    }

    #[test]
    fn reregister_overwrites() {
        let catalog = SessionCatalog::new(false);
        catalog.register_table("t", scan_plan("first"));
        catalog.register_table("t", scan_plan("second"));

        let plan = catalog.lookup_table("t").unwrap();
        match plan {
            LogicalOperator::Scan(n) => assert_eq!(Some("second".to_string()), n.node.table),
            other => panic!("unexpected plan: {}", other.name()),
        }
    }

    #[test]
    fn cache_swap_round_trip() {
        let catalog = SessionCatalog::new(false);
        catalog.register_table("t", scan_plan("t"));
        assert!(!catalog.is_cached("t"));

        catalog
            .swap_in_cached(
                "t",
                RowCollection::empty(),
                vec![Attribute::new("a", DataType::Int64, false)],
            )
            .unwrap();
        assert!(catalog.is_cached("t"));

        catalog.swap_out_cached("t").unwrap();
        assert!(!catalog.is_cached("t"));
    }

    #[test]
    fn uncache_non_cached_fails() {
        let catalog = SessionCatalog::new(false);
        catalog.register_table("t", scan_plan("t"));
        let err = catalog.swap_out_cached("t").unwrap_err();
        assert!(matches!(err, RiptideError::InvalidArgument(_)));
    }
}
