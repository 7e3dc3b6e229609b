pub mod collection;
pub mod partitioning;
