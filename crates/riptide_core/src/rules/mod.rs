//! Generic rule batch runner shared by the analyzer, the optimizer, and the
//! physical preparation pass.

use riptide_error::{Result, RiptideError};
use tracing::{debug, warn};

/// Default iteration cap for fixed point batches.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// A pure plan to plan rewrite.
///
/// Rules must be total: a rule that doesn't apply to a node returns the plan
/// unchanged. Rules that recurse into children must transform children before
/// parents.
pub trait Rule<P> {
    fn name(&self) -> &'static str;

    fn apply(&self, plan: P) -> Result<P>;
}

/// How often a batch's rules are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Apply each rule exactly once, in order.
    Once,
    /// Re-apply the whole rule list until the tree stops changing, or until
    /// the iteration cap is hit.
    FixedPoint { max_iterations: usize },
}

/// An ordered list of rules with a repeat policy.
pub struct Batch<P> {
    pub name: &'static str,
    pub policy: BatchPolicy,
    pub rules: Vec<Box<dyn Rule<P>>>,
}

impl<P> Batch<P> {
    pub fn once(name: &'static str, rules: Vec<Box<dyn Rule<P>>>) -> Self {
        Batch {
            name,
            policy: BatchPolicy::Once,
            rules,
        }
    }

    pub fn fixed_point(name: &'static str, rules: Vec<Box<dyn Rule<P>>>) -> Self {
        Batch {
            name,
            policy: BatchPolicy::FixedPoint {
                max_iterations: DEFAULT_MAX_ITERATIONS,
            },
            rules,
        }
    }
}

/// Runs batches of rules over a plan.
///
/// Batch order is a correctness contract: callers construct their batch list
/// so that rules later in the list may rely on the rewrites of earlier
/// batches having been applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExecutor {
    /// When set, failing to reach a fixed point within the iteration cap is
    /// an error instead of a warning.
    pub strict: bool,
}

impl RuleExecutor {
    pub fn new(strict: bool) -> Self {
        RuleExecutor { strict }
    }

    pub fn run_batches<P>(&self, mut plan: P, batches: &[Batch<P>]) -> Result<P>
    where
        P: Clone + PartialEq,
    {
        for batch in batches {
            plan = self.run_batch(plan, batch)?;
        }
        Ok(plan)
    }

    fn run_batch<P>(&self, mut plan: P, batch: &Batch<P>) -> Result<P>
    where
        P: Clone + PartialEq,
    {
        match batch.policy {
            BatchPolicy::Once => {
                for rule in &batch.rules {
                    plan = rule.apply(plan)?;
                }
                Ok(plan)
            }
            BatchPolicy::FixedPoint { max_iterations } => {
                for iteration in 0..max_iterations {
                    let before = plan.clone();
                    for rule in &batch.rules {
                        plan = rule.apply(plan)?;
                    }
                    if plan == before {
                        debug!(
                            batch = batch.name,
                            iterations = iteration + 1,
                            "batch reached fixed point"
                        );
                        return Ok(plan);
                    }
                }

                if self.strict {
                    return Err(RiptideError::Convergence {
                        batch: batch.name.to_string(),
                        iterations: max_iterations,
                    });
                }
                // Non-fatal: proceed with the last tree.
                warn!(
                    batch = batch.name,
                    iterations = max_iterations,
                    "batch did not reach a fixed point, continuing with last tree"
                );
                Ok(plan)
            }
        }
    }
}
