use std::path::{Path, PathBuf};
use chrono::Utc;
use tracing::{debug, info, warn};
use crate::analysis::tokenizer::LineTokenizer;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::EngineStats;
use crate::core::types::{Row, RowId, FIRST_DATA_ROW};
use crate::index::inverted::InvertedIndex;
use crate::index::offsets::RowOffsetMap;
use crate::index::row_cache::RowCache;
use crate::query::parser::QueryParser;
use crate::reader::chunked::ChunkedLineReader;
use crate::search::executor::{decode_row, QueryExecutor, RowSink, SearchContext};
use crate::storage::layout::StorageLayout;
use crate::storage::persist::{Checkpoint, Persistence};

/// Field-index engine over one delimited source file.
///
/// Lifecycle:
/// 1. `initialize(path)` opens the file and resets all in-memory state
/// 2. `parse_headers()` reads the header line (row 1)
/// 3. `process_rows(batch_size, sink)` streams every data record through the
///    tokenizer and detector into the index, offset map, and row cache,
///    snapshotting to storage every `checkpoint_interval` rows
/// 4. `load_index()` / `load_offsets()` replace in-memory state with the
///    committed snapshot
/// 5. `search(query, sink)` runs the two-stage executor over the snapshot
///
/// Ingestion and search each take `&mut self`, so only one long-running
/// operation is ever in flight and the single file cursor is never shared.
pub struct Engine {
    config: Config,
    persistence: Persistence,
    tokenizer: LineTokenizer,
    parser: QueryParser,
    executor: QueryExecutor,
    reader: Option<ChunkedLineReader>,
    source_path: Option<PathBuf>,
    headers: Vec<String>,
    index: InvertedIndex,
    offsets: RowOffsetMap,
    cache: RowCache,
    rows_indexed: u64,
    index_loaded: bool,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        let layout = StorageLayout::new(config.storage_root.clone())?;
        let executor = QueryExecutor::new(config.result_flush_interval);
        let cache = RowCache::new(config.row_cache_capacity);

        Ok(Engine {
            persistence: Persistence::new(layout),
            tokenizer: LineTokenizer::new(),
            parser: QueryParser::new(),
            executor,
            reader: None,
            source_path: None,
            headers: Vec::new(),
            index: InvertedIndex::new(),
            offsets: RowOffsetMap::new(),
            cache,
            rows_indexed: 0,
            index_loaded: false,
            config,
        })
    }

    /// Open the source file and reset all in-memory state.
    pub async fn initialize(&mut self, path: &Path) -> Result<()> {
        let reader = ChunkedLineReader::open(path, self.config.chunk_size).await?;
        self.reader = Some(reader);
        self.source_path = Some(path.to_path_buf());
        self.headers.clear();
        self.index.clear();
        self.offsets.clear();
        self.cache.clear();
        self.rows_indexed = 0;
        self.index_loaded = false;
        info!(path = %path.display(), "source file opened");
        Ok(())
    }

    /// Read and record the header line. Fewer than two columns is rejected.
    pub async fn parse_headers(&mut self) -> Result<()> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "engine not initialized".to_string()))?;

        reader.seek_to(0).await?;
        let record = reader.next_record().await?.ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput, "source file is empty".to_string())
        })?;

        let headers = self.tokenizer.tokenize(&record.text);
        if headers.len() < 2 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("header line has {} column(s), need at least two", headers.len()),
            ));
        }

        info!(columns = headers.len(), "headers parsed");
        self.headers = headers;
        Ok(())
    }

    /// Stream every data record into the index, handing decoded rows to the
    /// sink in batches of `batch_size` and snapshotting periodically.
    /// Returns the number of rows indexed.
    ///
    /// Every data line advances the row counter, so IDs always equal the
    /// 1-based line number in the file; malformed records are skipped but
    /// still consume their line's ID. Re-running without `initialize` will
    /// accumulate duplicate postings.
    pub async fn process_rows(&mut self, batch_size: usize, sink: &mut dyn RowSink) -> Result<u64> {
        if self.headers.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "headers not parsed".to_string(),
            ));
        }
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "engine not initialized".to_string()))?;
        let batch_size = batch_size.max(1);

        // Restart from the top of the file and skip the header line
        reader.seek_to(0).await?;
        reader.next_record().await?;

        let mut row_number = FIRST_DATA_ROW;
        let mut batch: Vec<Row> = Vec::new();
        let mut indexed: u64 = 0;

        while let Some(record) = reader.next_record().await? {
            let row_id = RowId::new(row_number);
            row_number += 1;

            let tokens = self.tokenizer.tokenize(&record.text);
            if tokens.len() != self.headers.len() {
                warn!(
                    row = row_id.value(),
                    expected = self.headers.len(),
                    found = tokens.len(),
                    "skipping malformed record"
                );
                continue;
            }

            self.offsets.insert(row_id, record.offset);
            for (header, token) in self.headers.iter().zip(&tokens) {
                self.index.insert(header, token, row_id);
            }
            let row = decode_row(row_id, &self.headers, &tokens);
            self.cache.cache_row(row_id, row.clone());
            batch.push(row);
            indexed += 1;

            if batch.len() >= batch_size {
                sink.deliver(&batch)?;
                batch.clear();
            }
            if indexed % self.config.checkpoint_interval == 0 {
                Self::checkpoint(
                    &self.persistence,
                    &self.index,
                    &self.offsets,
                    indexed,
                    &self.source_path,
                )
                .await;
            }
        }

        if !batch.is_empty() {
            sink.deliver(&batch)?;
        }
        Self::checkpoint(
            &self.persistence,
            &self.index,
            &self.offsets,
            indexed,
            &self.source_path,
        )
        .await;

        self.rows_indexed = indexed;
        // The live index is uncommitted until an explicit load
        self.index_loaded = false;
        info!(rows = indexed, "ingestion complete");
        Ok(indexed)
    }

    /// Replace the in-memory index with the persisted snapshot. Returns
    /// false when no snapshot exists or it fails to decode; in-memory state
    /// is left untouched in that case.
    pub async fn load_index(&mut self) -> Result<bool> {
        match self.persistence.load_index().await? {
            Some(index) => {
                self.index = index;
                self.index_loaded = true;
                info!("index snapshot loaded");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the in-memory offset map with the persisted snapshot.
    pub async fn load_offsets(&mut self) -> Result<bool> {
        match self.persistence.load_offsets().await? {
            Some(offsets) => {
                self.offsets = offsets;
                info!("offsets snapshot loaded");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn last_checkpoint(&self) -> Result<Option<Checkpoint>> {
        self.persistence.load_checkpoint().await
    }

    /// Execute a textual query against the loaded snapshot, delivering
    /// matched rows to the sink in flush-interval batches and returning the
    /// flattened result. Searching before a successful `load_index` fails
    /// with `IndexUnavailable`; a query naming an unindexed field fails with
    /// `UnknownField`. Both are distinct from an empty result.
    pub async fn search(&mut self, query: &str, sink: &mut dyn RowSink) -> Result<Vec<Row>> {
        let conditions = self.parser.parse(query)?;

        if !self.index_loaded {
            return Err(Error::new(
                ErrorKind::IndexUnavailable,
                "no persisted index loaded".to_string(),
            ));
        }
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "engine not initialized".to_string()))?;

        debug!(query, conditions = conditions.len(), "executing search");
        let ctx = SearchContext {
            index: &self.index,
            offsets: &self.offsets,
            cache: &mut self.cache,
            reader,
            headers: &self.headers,
            tokenizer: &self.tokenizer,
        };
        self.executor.execute(&conditions, ctx, sink).await
    }

    /// Direct access to the index query operations.
    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Fuzzy value lookup using the configured default edit-distance bound.
    pub fn fuzzy_match(&self, field: &str, value: &str) -> Vec<RowId> {
        self.index
            .fuzzy_match(field, value, self.config.fuzzy_threshold)
    }

    pub fn offsets(&self) -> &RowOffsetMap {
        &self.offsets
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            rows_indexed: self.rows_indexed,
            field_count: self.index.field_count(),
            distinct_values: self.index.distinct_value_count(),
            cached_rows: self.cache.len(),
            index_loaded: self.index_loaded,
        }
    }

    async fn checkpoint(
        persistence: &Persistence,
        index: &InvertedIndex,
        offsets: &RowOffsetMap,
        rows: u64,
        source: &Option<PathBuf>,
    ) {
        let outcome = async {
            persistence.save_index(index).await?;
            persistence.save_offsets(offsets).await?;
            persistence
                .save_checkpoint(&Checkpoint {
                    timestamp: Utc::now(),
                    rows_processed: rows,
                    source: source
                        .as_ref()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default(),
                })
                .await
        }
        .await;

        match outcome {
            Ok(()) => debug!(rows, "snapshot saved"),
            Err(err) => warn!(error = %err, "snapshot save failed, continuing"),
        }
    }
}
