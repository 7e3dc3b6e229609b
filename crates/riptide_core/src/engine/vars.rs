//! Session scoped configuration.

use std::collections::HashMap;

use parking_lot::RwLock;
use riptide_error::{Result, RiptideError};
use tracing::warn;

/// Number of partitions produced by hash exchanges.
pub const SHUFFLE_COUNT: &str = "partitions.shuffle_count";
/// Whether catalog and column name matching is case sensitive.
pub const CASE_SENSITIVE: &str = "catalog.case_sensitive";
/// Whether a rule batch missing its iteration cap aborts the query instead
/// of proceeding with the last tree.
pub const FAIL_ON_NON_CONVERGENCE: &str = "planner.fail_on_non_convergence";

/// Old name for [`SHUFFLE_COUNT`], still accepted.
const DEPRECATED_SHUFFLE_COUNT: &str = "shuffle.partitions";

const DEFAULT_SHUFFLE_COUNT: usize = 8;

/// String key/value settings for one session.
///
/// Known keys are validated on set; unknown keys are stored as-is so callers
/// can stash their own settings.
#[derive(Debug)]
pub struct SessionVars {
    vals: RwLock<HashMap<String, String>>,
}

impl Default for SessionVars {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionVars {
    pub fn new() -> Self {
        let mut vals = HashMap::new();
        vals.insert(SHUFFLE_COUNT.to_string(), DEFAULT_SHUFFLE_COUNT.to_string());
        vals.insert(CASE_SENSITIVE.to_string(), "false".to_string());
        vals.insert(FAIL_ON_NON_CONVERGENCE.to_string(), "false".to_string());
        SessionVars {
            vals: RwLock::new(vals),
        }
    }

    fn resolve_key(key: &str) -> &str {
        if key == DEPRECATED_SHUFFLE_COUNT {
            warn!(
                deprecated = DEPRECATED_SHUFFLE_COUNT,
                replacement = SHUFFLE_COUNT,
                "deprecated setting name, use the replacement"
            );
            return SHUFFLE_COUNT;
        }
        key
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = Self::resolve_key(key);
        match key {
            SHUFFLE_COUNT => {
                let parsed: usize = value.parse().map_err(|_| {
                    RiptideError::invalid_argument(format!(
                        "'{key}' expects a positive integer, got '{value}'"
                    ))
                })?;
                if parsed == 0 {
                    return Err(RiptideError::invalid_argument(format!(
                        "'{key}' must be at least 1"
                    )));
                }
            }
            CASE_SENSITIVE | FAIL_ON_NON_CONVERGENCE => {
                value.parse::<bool>().map_err(|_| {
                    RiptideError::invalid_argument(format!(
                        "'{key}' expects true or false, got '{value}'"
                    ))
                })?;
            }
            _ => (),
        }
        self.vals
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let key = Self::resolve_key(key);
        self.vals.read().get(key).cloned()
    }

    /// All settings, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .vals
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn shuffle_partitions(&self) -> usize {
        self.typed(SHUFFLE_COUNT, DEFAULT_SHUFFLE_COUNT)
    }

    pub fn case_sensitive(&self) -> bool {
        self.typed(CASE_SENSITIVE, false)
    }

    pub fn fail_on_non_convergence(&self) -> bool {
        self.typed(FAIL_ON_NON_CONVERGENCE, false)
    }

    /// Validated on set, so parse failures only happen if the default list
    /// changes; fall back rather than panic.
    fn typed<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.vals
            .read()
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_present() {
        let vars = SessionVars::new();
        assert_eq!(8, vars.shuffle_partitions());
        assert!(!vars.case_sensitive());
        assert!(!vars.fail_on_non_convergence());
    }

    #[test]
    fn deprecated_key_redirects() {
        let vars = SessionVars::new();
        vars.set("shuffle.partitions", "4").unwrap();
        assert_eq!(4, vars.shuffle_partitions());
        assert_eq!(Some("4".to_string()), vars.get("shuffle.partitions"));
        // The stored key is the new name.
        assert!(vars.entries().iter().all(|(k, _)| k != "shuffle.partitions"));
    }

    #[test]
    fn known_keys_validated() {
        let vars = SessionVars::new();
        assert!(vars.set(SHUFFLE_COUNT, "zero").is_err());
        assert!(vars.set(SHUFFLE_COUNT, "0").is_err());
        assert!(vars.set(CASE_SENSITIVE, "maybe").is_err());
    }

    #[test]
    fn unknown_keys_stored() {
        let vars = SessionVars::new();
        vars.set("app.tag", "blue").unwrap();
        assert_eq!(Some("blue".to_string()), vars.get("app.tag"));
    }
}
