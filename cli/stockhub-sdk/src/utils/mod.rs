pub mod debounce;
pub mod query_cache;
