pub mod inverted;
pub mod offsets;
pub mod row_cache;
