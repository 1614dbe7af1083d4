use std::fs;
use std::path::PathBuf;
use crate::core::error::Result;

/// Durable-storage locations, rooted at an explicitly injected directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(StorageLayout { base_dir })
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("index.bin")
    }

    pub fn offsets_path(&self) -> PathBuf {
        self.base_dir.join("offsets.bin")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.base_dir.join("checkpoint.bin")
    }
}
