//! Relational query planning and staged execution core.
//!
//! Turns a logical plan tree into an executable physical plan through a
//! fixed pipeline: analysis (name/type resolution against a session catalog),
//! optimization (semantics-preserving rewrites), strategy-based physical
//! planning, and a final pass inserting data redistribution boundaries.
//! Execution happens over an in-process partitioned row collection standing
//! in for the distributed substrate.

pub mod analyzer;
pub mod arrays;
pub mod catalog;
pub mod engine;
pub mod explain;
pub mod expr;
pub mod logical;
pub mod optimizer;
pub mod physical;
pub mod rules;
pub mod runtime;
