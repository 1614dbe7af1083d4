use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};
use crate::analysis::detect::{detect_value, parse_date};
use crate::analysis::tokenizer::LineTokenizer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{FieldValue, Row, RowId};
use crate::index::inverted::{InvertedIndex, NULL_VALUE};
use crate::index::offsets::RowOffsetMap;
use crate::index::row_cache::RowCache;
use crate::query::types::{Operator, QueryCondition};
use crate::reader::chunked::ChunkedLineReader;

/// Downstream analysis collaborator. Receives complete batches of decoded
/// rows, in order; what happens to them afterwards is not this crate's
/// concern.
pub trait RowSink {
    fn deliver(&mut self, batch: &[Row]) -> Result<()>;
}

/// Sink for callers that only want the returned row data.
pub struct NullSink;

impl RowSink for NullSink {
    fn deliver(&mut self, _batch: &[Row]) -> Result<()> {
        Ok(())
    }
}

/// Everything the executor borrows from the engine for one search.
pub struct SearchContext<'a> {
    pub index: &'a InvertedIndex,
    pub offsets: &'a RowOffsetMap,
    pub cache: &'a mut RowCache,
    pub reader: &'a mut ChunkedLineReader,
    pub headers: &'a [String],
    pub tokenizer: &'a LineTokenizer,
}

/// Two-stage query executor.
///
/// Stage one resolves every condition against the index's string keys and
/// intersects the candidate sets. Stage two reloads each surviving row
/// (cache hit or random-access re-read) and re-validates every condition
/// against the typed values; that recheck is authoritative. The coarse
/// stage can under- or over-select on numeric and date fields because index
/// keys order as strings; only over-selection is corrected here.
pub struct QueryExecutor {
    flush_interval: usize,
}

impl QueryExecutor {
    pub fn new(flush_interval: usize) -> Self {
        QueryExecutor {
            flush_interval: flush_interval.max(1),
        }
    }

    pub async fn execute(
        &self,
        conditions: &[QueryCondition],
        mut ctx: SearchContext<'_>,
        sink: &mut dyn RowSink,
    ) -> Result<Vec<Row>> {
        // Coarse index stage. A field missing from the index aborts the
        // whole query; that is distinct from matching zero rows.
        let mut surviving: Option<HashSet<RowId>> = None;
        for condition in conditions {
            if !ctx.index.has_field(&condition.field) {
                return Err(Error::new(
                    ErrorKind::UnknownField,
                    format!("field '{}' is not indexed", condition.field),
                ));
            }
            let candidates = Self::coarse_candidates(ctx.index, condition);
            match &mut surviving {
                None => surviving = Some(candidates.into_iter().collect()),
                Some(set) => {
                    let narrowing: HashSet<RowId> = candidates.into_iter().collect();
                    set.retain(|id| narrowing.contains(id));
                }
            }
        }

        let mut ids: Vec<RowId> = surviving.unwrap_or_default().into_iter().collect();
        ids.sort();
        debug!(candidates = ids.len(), "coarse index stage complete");

        // Authoritative per-row stage
        let mut results: Vec<Row> = Vec::new();
        let mut flushed = 0;
        for id in ids {
            let Some(row) = self.load_row(&mut ctx, id).await? else {
                continue;
            };
            if conditions
                .iter()
                .all(|condition| matches_condition(&row, condition))
            {
                results.push(row);
                if results.len() - flushed >= self.flush_interval {
                    sink.deliver(&results[flushed..])?;
                    flushed = results.len();
                }
            }
        }
        if results.len() > flushed {
            sink.deliver(&results[flushed..])?;
        }

        debug!(matched = results.len(), "typed re-validation complete");
        Ok(results)
    }

    fn coarse_candidates(index: &InvertedIndex, condition: &QueryCondition) -> Vec<RowId> {
        match &condition.op {
            Operator::Equals(value) => index
                .lookup_exact(&condition.field, value)
                .cloned()
                .unwrap_or_default(),
            Operator::LessThan(bound) => index.lookup_less_than(&condition.field, bound),
            Operator::GreaterThan(bound) => index.lookup_greater_than(&condition.field, bound),
            Operator::Range(low, high) => index.lookup_range(&condition.field, low, high),
        }
    }

    /// Cache-then-reload row access: cache hit, or a random-access re-read
    /// at the stored offset, decoded and cached for next time.
    async fn load_row(&self, ctx: &mut SearchContext<'_>, id: RowId) -> Result<Option<Row>> {
        if let Some(row) = ctx.cache.get_row(id) {
            return Ok(Some(row));
        }

        let Some(offset) = ctx.offsets.get(id) else {
            warn!(row = id.value(), "candidate row has no stored offset");
            return Ok(None);
        };
        let Some(record) = ctx.reader.read_record_at(offset).await? else {
            warn!(row = id.value(), offset, "stored offset points past end of file");
            return Ok(None);
        };

        let tokens = ctx.tokenizer.tokenize(&record.text);
        if tokens.len() != ctx.headers.len() {
            warn!(row = id.value(), "re-read record no longer matches header shape");
            return Ok(None);
        }

        let row = decode_row(id, ctx.headers, &tokens);
        ctx.cache.cache_row(id, row.clone());
        Ok(Some(row))
    }
}

/// Build a typed row from tokenized field values, in header order.
pub fn decode_row(id: RowId, headers: &[String], tokens: &[String]) -> Row {
    let mut row = Row::new(id);
    for (header, token) in headers.iter().zip(tokens) {
        row.add_field(header.clone(), detect_value(token));
    }
    row
}

/// Authoritative condition check against a row's typed value.
pub fn matches_condition(row: &Row, condition: &QueryCondition) -> bool {
    let Some(value) = row.get_field(&condition.field) else {
        return false;
    };
    match &condition.op {
        Operator::Equals(want) => value_equals(value, want),
        Operator::LessThan(bound) => {
            matches!(compare_typed(value, bound), Some(Ordering::Less))
        }
        Operator::GreaterThan(bound) => {
            matches!(compare_typed(value, bound), Some(Ordering::Greater))
        }
        Operator::Range(low, high) => {
            matches!(
                compare_typed(value, low),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                compare_typed(value, high),
                Some(Ordering::Less | Ordering::Equal)
            )
        }
    }
}

fn value_equals(value: &FieldValue, want: &str) -> bool {
    match value {
        FieldValue::Empty => want == NULL_VALUE || want.is_empty(),
        FieldValue::Integer(i) => match detect_value(want) {
            FieldValue::Integer(j) => *i == j,
            FieldValue::Float(f) => *i as f64 == f,
            _ => false,
        },
        FieldValue::Float(f) => match detect_value(want) {
            FieldValue::Integer(j) => *f == j as f64,
            FieldValue::Float(g) => *f == g,
            _ => false,
        },
        FieldValue::Date(date) => parse_date(want).is_some_and(|want| *date == want),
        FieldValue::Text(text) => text == want,
    }
}

/// Typed ordering of a stored value against a textual bound: numeric for
/// Integer/Float, calendar for Date, lexicographic for Text. Empty values
/// and unparseable bounds order against nothing.
fn compare_typed(value: &FieldValue, bound: &str) -> Option<Ordering> {
    match value {
        FieldValue::Empty => None,
        FieldValue::Integer(i) => {
            let bound: f64 = bound.parse().ok()?;
            (*i as f64).partial_cmp(&bound)
        }
        FieldValue::Float(f) => {
            let bound: f64 = bound.parse().ok()?;
            f.partial_cmp(&bound)
        }
        FieldValue::Date(date) => parse_date(bound).map(|bound| date.cmp(&bound)),
        FieldValue::Text(text) => Some(text.as_str().cmp(bound)),
    }
}
