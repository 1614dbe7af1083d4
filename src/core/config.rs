use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_root: PathBuf,

    pub chunk_size: usize,                // Bytes per read when streaming records
    pub checkpoint_interval: u64,         // Re-save snapshots every N ingested rows
    pub result_flush_interval: usize,     // Flush search batches every N matched rows
    pub row_cache_capacity: usize,        // Max decoded rows kept in memory
    pub fuzzy_threshold: u8,              // Default edit-distance bound
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_root: PathBuf::from("./data"),
            chunk_size: 64 * 1024,        // 64KB per disk read
            checkpoint_interval: 500,     // Snapshot every 500 rows
            result_flush_interval: 500,   // Hand off every 500 matches
            row_cache_capacity: 10_000,   // ~10k decoded rows resident
            fuzzy_threshold: 2,
        }
    }
}
