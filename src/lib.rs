pub mod core;
pub mod analysis;
pub mod reader;
pub mod index;
pub mod query;
pub mod search;
pub mod storage;

pub use crate::core::config::Config;
pub use crate::core::engine::Engine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::EngineStats;
pub use crate::core::types::{FieldValue, Row, RowId};
pub use crate::search::executor::{NullSink, RowSink};

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                          ROWDEX STRUCT ARCHITECTURE                      │
└──────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── CORE LAYER ────────────────────────────────┐
│                                                                          │
│  ┌────────────────────────────────────────────────────────────────────┐ │
│  │                           struct Engine                            │ │
│  │  config: Config               // Storage root, intervals, sizes    │ │
│  │  persistence: Persistence     // Snapshot save/load                │ │
│  │  tokenizer: LineTokenizer     // Quote-aware record splitting      │ │
│  │  parser: QueryParser          // Textual query → conditions        │ │
│  │  executor: QueryExecutor      // Two-stage condition evaluation    │ │
│  │  reader: ChunkedLineReader    // Single file handle + cursor       │ │
│  │  headers: Vec<String>         // Lowercase header list (row 1)     │ │
│  │  index: InvertedIndex         // field → value → row IDs           │ │
│  │  offsets: RowOffsetMap        // row ID → byte offset              │ │
│  │  cache: RowCache              // row ID → decoded Row (LRU)        │ │
│  └────────────────────────────────────────────────────────────────────┘ │
│                                                                          │
│  ┌──────────────────┐  ┌──────────────────┐  ┌────────────────────────┐ │
│  │ struct RowId     │  │ enum FieldValue  │  │ struct Row             │ │
│  │ • 0: u64         │  │ • Empty          │  │ • id: RowId            │ │
│  └──────────────────┘  │ • Integer(i64)   │  │ • fields: Vec<(name,   │ │
│                        │ • Float(f64)     │  │     FieldValue)>       │ │
│                        │ • Date(NaiveDate)│  │ • duplicate: bool      │ │
│                        │ • Text(String)   │  └────────────────────────┘ │
│                        └──────────────────┘                             │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────── DATA FLOW ───────────────────────────────────┐
│                                                                          │
│  Ingestion:  ChunkedLineReader ──> LineTokenizer ──> detect_value        │
│                    │                                      │              │
│                    └──offsets──> RowOffsetMap    InvertedIndex <─────────┤
│                                                                          │
│  Search:  QueryParser ──> QueryExecutor ──coarse──> InvertedIndex        │
│                                │                                         │
│                                └──recheck──> RowCache / re-read at       │
│                                              offset ──> typed compare    │
│                                                                          │
│  Persistence:  InvertedIndex + RowOffsetMap ──bincode+crc32──> snapshot  │
│                files under StorageLayout root, every N ingested rows     │
└──────────────────────────────────────────────────────────────────────────┘
*/
