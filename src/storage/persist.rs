use std::path::Path;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::warn;
use crate::core::error::Result;
use crate::index::inverted::InvertedIndex;
use crate::index::offsets::RowOffsetMap;
use crate::storage::layout::StorageLayout;

/// Ingestion progress recorded beside each snapshot pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub rows_processed: u64,
    pub source: String,
}

/// Snapshot save/load for the inverted index and the row-offset map.
///
/// Each file is the bincode body prefixed with a 4-byte little-endian CRC32
/// of that body. There is no incremental persistence; every save rewrites
/// the whole structure. A missing file, CRC mismatch, or decode failure is
/// reported as an absent load, never raised as a fatal error.
pub struct Persistence {
    layout: StorageLayout,
}

impl Persistence {
    pub fn new(layout: StorageLayout) -> Self {
        Persistence { layout }
    }

    pub async fn save_index(&self, index: &InvertedIndex) -> Result<()> {
        self.save_document(&self.layout.index_path(), index).await
    }

    pub async fn load_index(&self) -> Result<Option<InvertedIndex>> {
        self.load_document(&self.layout.index_path()).await
    }

    pub async fn save_offsets(&self, offsets: &RowOffsetMap) -> Result<()> {
        self.save_document(&self.layout.offsets_path(), offsets).await
    }

    pub async fn load_offsets(&self) -> Result<Option<RowOffsetMap>> {
        self.load_document(&self.layout.offsets_path()).await
    }

    pub async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.save_document(&self.layout.checkpoint_path(), checkpoint)
            .await
    }

    pub async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        self.load_document(&self.layout.checkpoint_path()).await
    }

    async fn save_document<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let body = bincode::serialize(value)?;
        let mut framed = Vec::with_capacity(body.len() + 4);
        framed.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        framed.extend_from_slice(&body);
        fs::write(path, framed).await?;
        Ok(())
    }

    async fn load_document<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if data.len() < 4 {
            warn!(path = %path.display(), "snapshot too short, ignoring");
            return Ok(None);
        }
        let (header, body) = data.split_at(4);
        let expected = u32::from_le_bytes(header.try_into().unwrap());
        if crc32fast::hash(body) != expected {
            warn!(path = %path.display(), "snapshot checksum mismatch, ignoring");
            return Ok(None);
        }

        match bincode::deserialize(body) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "snapshot decode failed, ignoring");
                Ok(None)
            }
        }
    }
}
