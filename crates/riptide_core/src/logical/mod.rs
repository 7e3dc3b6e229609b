pub mod logical_aggregate;
pub mod logical_cache;
pub mod logical_describe;
pub mod logical_explain;
pub mod logical_filter;
pub mod logical_join;
pub mod logical_limit;
pub mod logical_order;
pub mod logical_project;
pub mod logical_scan;
pub mod logical_set;
pub mod logical_setop;
pub mod logical_single_row;
pub mod operator;
