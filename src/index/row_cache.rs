use std::num::NonZeroUsize;
use lru::LruCache;
use crate::core::types::{Row, RowId};

/// Memoization table for decoded rows, filled during ingestion and on
/// random-access re-reads. Bounded LRU rather than the grow-forever map a
/// naive implementation would use; capacity comes from `Config`.
pub struct RowCache {
    cache: LruCache<RowId, Row>,
}

impl RowCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        RowCache {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get_row(&mut self, row_id: RowId) -> Option<Row> {
        self.cache.get(&row_id).cloned()
    }

    pub fn cache_row(&mut self, row_id: RowId, row: Row) {
        self.cache.put(row_id, row);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
