/// Point-in-time view of engine state, cheap to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub rows_indexed: u64,
    pub field_count: usize,
    pub distinct_values: usize,
    pub cached_rows: usize,
    pub index_loaded: bool,
}
