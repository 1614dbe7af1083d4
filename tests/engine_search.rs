//! End-to-end tests: ingest a delimited file, checkpoint, reload the
//! snapshot, and query it through the textual condition language.

use std::path::PathBuf;
use chrono::NaiveDate;
use rowdex::core::error::ErrorKind;
use rowdex::{Config, Engine, FieldValue, Row, RowId, RowSink};

struct CollectSink {
    batches: Vec<Vec<Row>>,
}

impl CollectSink {
    fn new() -> Self {
        CollectSink { batches: Vec::new() }
    }

    fn rows(&self) -> Vec<Row> {
        self.batches.iter().flatten().cloned().collect()
    }
}

impl RowSink for CollectSink {
    fn deliver(&mut self, batch: &[Row]) -> rowdex::Result<()> {
        self.batches.push(batch.to_vec());
        Ok(())
    }
}

const FIXTURE: &str = "\
id,Name,Age,joined
1,Dave,30,2020-01-15
2,dave,40,2021-06-01
3,Sara,,2019-11-20
4,dav,22,03/14/2022
5,davo,23,2022/07/09
";

fn write_fixture(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("people.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn config_for(dir: &tempfile::TempDir) -> Config {
    Config {
        storage_root: dir.path().join("data"),
        ..Config::default()
    }
}

async fn ingested_engine(dir: &tempfile::TempDir) -> Engine {
    let path = write_fixture(dir, FIXTURE);
    let mut engine = Engine::new(config_for(dir)).unwrap();
    engine.initialize(&path).await.unwrap();
    engine.parse_headers().await.unwrap();
    let mut sink = CollectSink::new();
    engine.process_rows(100, &mut sink).await.unwrap();
    engine
}

#[tokio::test]
async fn ingestion_indexes_every_valid_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, FIXTURE);

    let mut engine = Engine::new(config_for(&dir)).unwrap();
    engine.initialize(&path).await.unwrap();
    engine.parse_headers().await.unwrap();
    assert_eq!(engine.headers(), ["id", "name", "age", "joined"]);

    let mut sink = CollectSink::new();
    let indexed = engine.process_rows(2, &mut sink).await.unwrap();
    assert_eq!(indexed, 5);

    // Batches of 2, 2, then a final partial batch of 1, in file order
    assert_eq!(
        sink.batches.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![2, 2, 1]
    );
    let ids: Vec<u64> = sink.rows().iter().map(|row| row.id.value()).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6]);

    // First data record is spreadsheet row 2
    assert_eq!(
        engine.index().lookup_exact("name", "dave"),
        Some(&vec![RowId(2), RowId(3)])
    );

    let dupes = engine.index().duplicates("name");
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes["dave"], vec![RowId(2), RowId(3)]);

    // Empty age is retrievable under the null sentinel
    assert_eq!(engine.index().missing_value_rows("age"), vec![RowId(4)]);
    assert_eq!(engine.index().lookup_exact("age", "null"), Some(&vec![RowId(4)]));

    let stats = engine.stats();
    assert_eq!(stats.rows_indexed, 5);
    assert_eq!(stats.field_count, 4);
    assert!(!stats.index_loaded);
}

#[tokio::test]
async fn count_always_matches_exact_lookup_length() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ingested_engine(&dir).await;

    let fields: Vec<String> = engine.index().fields().cloned().collect();
    for field in fields {
        for value in engine.index().unique_values(&field) {
            assert_eq!(
                engine.index().count(&field, &value),
                engine.index().lookup_exact(&field, &value).unwrap().len()
            );
        }
    }
}

#[tokio::test]
async fn search_before_load_is_index_unavailable_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = ingested_engine(&dir).await;

    let mut sink = CollectSink::new();
    let err = engine.search("name=dave", &mut sink).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::IndexUnavailable);
}

#[tokio::test]
async fn search_revalidates_with_numeric_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = ingested_engine(&dir).await;
    assert!(engine.load_index().await.unwrap());
    assert!(engine.load_offsets().await.unwrap());

    // The "null" key sneaks past the string-ordered index stage; the typed
    // recheck throws it out
    let mut sink = CollectSink::new();
    let rows = engine.search("age>35", &mut sink).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, RowId(3));
    assert_eq!(rows[0].get_field("age"), Some(&FieldValue::Integer(40)));

    let rows = engine.search("age>25", &mut sink).await.unwrap();
    let ids: Vec<u64> = rows.iter().map(|row| row.id.value()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn conjunctive_query_intersects_conditions() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = ingested_engine(&dir).await;
    engine.load_index().await.unwrap();
    engine.load_offsets().await.unwrap();

    let mut sink = CollectSink::new();
    let rows = engine.search("name=dave and age<35", &mut sink).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, RowId(2));

    let rows = engine.search("age..22..30", &mut sink).await.unwrap();
    let ids: Vec<u64> = rows.iter().map(|row| row.id.value()).collect();
    assert_eq!(ids, vec![2, 5, 6]);
}

#[tokio::test]
async fn unknown_field_fails_distinctly_from_zero_matches() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = ingested_engine(&dir).await;
    engine.load_index().await.unwrap();
    engine.load_offsets().await.unwrap();

    let mut sink = CollectSink::new();
    let err = engine.search("salary>10", &mut sink).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownField);

    let rows = engine.search("name=nobody", &mut sink).await.unwrap();
    assert!(rows.is_empty());

    let err = engine.search("gibberish", &mut sink).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidQuery);
}

#[tokio::test]
async fn rows_round_trip_through_offset_re_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, FIXTURE);

    // Capacity 1 forces nearly every row through the re-read path
    let config = Config {
        storage_root: dir.path().join("data"),
        row_cache_capacity: 1,
        ..Config::default()
    };
    let mut engine = Engine::new(config).unwrap();
    engine.initialize(&path).await.unwrap();
    engine.parse_headers().await.unwrap();
    let mut sink = CollectSink::new();
    engine.process_rows(100, &mut sink).await.unwrap();
    engine.load_index().await.unwrap();
    engine.load_offsets().await.unwrap();

    let rows = engine.search("id>0", &mut sink).await.unwrap();
    assert_eq!(rows.len(), 5);

    let first = &rows[0];
    assert_eq!(first.id, RowId(2));
    assert_eq!(first.get_field("id"), Some(&FieldValue::Integer(1)));
    // Casing was folded at tokenization time and never comes back
    assert_eq!(
        first.get_field("name"),
        Some(&FieldValue::Text("dave".to_string()))
    );
    assert_eq!(first.get_field("age"), Some(&FieldValue::Integer(30)));
    assert_eq!(
        first.get_field("joined"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()))
    );

    // Every date format decodes to its calendar value
    assert_eq!(
        rows[3].get_field("joined"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2022, 3, 14).unwrap()))
    );
    assert_eq!(
        rows[4].get_field("joined"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2022, 7, 9).unwrap()))
    );
}

#[tokio::test]
async fn snapshot_reloads_identically_in_a_fresh_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ingested_engine(&dir).await;

    let mut fresh = Engine::new(config_for(&dir)).unwrap();
    assert!(fresh.load_index().await.unwrap());
    assert!(fresh.load_offsets().await.unwrap());

    assert_eq!(fresh.index(), engine.index());
    assert_eq!(fresh.offsets(), engine.offsets());
    assert_eq!(fresh.offsets().len(), 5);

    let checkpoint = fresh.last_checkpoint().await.unwrap().unwrap();
    assert_eq!(checkpoint.rows_processed, 5);
}

#[tokio::test]
async fn fuzzy_match_unions_all_nearby_value_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ingested_engine(&dir).await;

    let mut ids = engine.index().fuzzy_match("name", "dave", 1);
    ids.sort();
    assert_eq!(ids, vec![RowId(2), RowId(3), RowId(5), RowId(6)]);

    let ids = engine.index().fuzzy_match("name", "dave", 0);
    assert_eq!(ids, vec![RowId(2), RowId(3)]);

    // Engine-level lookup uses the configured default bound of 2
    let mut ids = engine.fuzzy_match("name", "dave");
    ids.sort();
    assert_eq!(ids, vec![RowId(2), RowId(3), RowId(5), RowId(6)]);
}

#[tokio::test]
async fn malformed_records_are_skipped_but_keep_line_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "a,b\n1,x\nbadrow\n2,y\n").unwrap();

    let mut engine = Engine::new(config_for(&dir)).unwrap();
    engine.initialize(&path).await.unwrap();
    engine.parse_headers().await.unwrap();
    let mut sink = CollectSink::new();
    let indexed = engine.process_rows(10, &mut sink).await.unwrap();

    assert_eq!(indexed, 2);
    // The bad line still consumed spreadsheet row 3
    assert_eq!(engine.index().lookup_exact("a", "1"), Some(&vec![RowId(2)]));
    assert_eq!(engine.index().lookup_exact("a", "2"), Some(&vec![RowId(4)]));
}

#[tokio::test]
async fn quoted_fields_ingest_with_embedded_delimiters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quoted.csv");
    std::fs::write(&path, "name,notes\n\"Smith, John\",\"said \"\"hi\"\"\"\n").unwrap();

    let mut engine = Engine::new(config_for(&dir)).unwrap();
    engine.initialize(&path).await.unwrap();
    engine.parse_headers().await.unwrap();
    let mut sink = CollectSink::new();
    let indexed = engine.process_rows(10, &mut sink).await.unwrap();

    assert_eq!(indexed, 1);
    assert_eq!(
        engine.index().lookup_exact("name", "smith, john"),
        Some(&vec![RowId(2)])
    );
    assert_eq!(
        engine.index().lookup_exact("notes", "said \"hi\""),
        Some(&vec![RowId(2)])
    );
}

#[tokio::test]
async fn single_column_headers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("narrow.csv");
    std::fs::write(&path, "only\n1\n2\n").unwrap();

    let mut engine = Engine::new(config_for(&dir)).unwrap();
    engine.initialize(&path).await.unwrap();
    let err = engine.parse_headers().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn process_rows_requires_parsed_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, FIXTURE);

    let mut engine = Engine::new(config_for(&dir)).unwrap();
    engine.initialize(&path).await.unwrap();
    let mut sink = CollectSink::new();
    let err = engine.process_rows(10, &mut sink).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}
