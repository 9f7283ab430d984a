pub mod merge;
pub mod results_store;
