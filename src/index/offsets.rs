use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use crate::core::types::RowId;

/// Row ID → byte offset of the record's first byte in the source file.
/// Captured at ingestion time; required for random-access re-reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowOffsetMap {
    offsets: HashMap<RowId, u64>,
}

impl RowOffsetMap {
    pub fn new() -> Self {
        RowOffsetMap {
            offsets: HashMap::new(),
        }
    }

    pub fn insert(&mut self, row_id: RowId, offset: u64) {
        self.offsets.insert(row_id, offset);
    }

    pub fn get(&self, row_id: RowId) -> Option<u64> {
        self.offsets.get(&row_id).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }
}
