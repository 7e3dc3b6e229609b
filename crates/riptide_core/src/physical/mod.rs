//! Physical operators, strategy planning, and the redistribution pass.

pub mod aggregate;
pub mod command;
pub mod distribution;
pub mod exchange;
pub mod filter;
pub mod joins;
pub mod limit;
pub mod plan;
pub mod planner;
pub mod project;
pub mod scan;
pub mod sort;
pub mod union;
pub mod values;
