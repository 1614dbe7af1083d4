use std::collections::{HashMap, HashSet};
use serde::{Serialize, Deserialize};
use crate::core::types::RowId;
use crate::search::fuzzy::FuzzyMatcher;

/// Index key used for fields whose value is the empty string.
pub const NULL_VALUE: &str = "null";

/// Field → value → ordered row-ID postings.
///
/// Field and value keys are lowercase; empty values are folded to the
/// `"null"` sentinel. Postings hold row IDs in discovery order, at most once
/// per bucket per ingestion pass. Re-ingesting without `clear()` accumulates
/// duplicates; that reset is the caller's responsibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, HashMap<String, Vec<RowId>>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            postings: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.postings.clear();
    }

    fn normalize_value(value: &str) -> String {
        if value.is_empty() {
            NULL_VALUE.to_string()
        } else {
            value.to_lowercase()
        }
    }

    /// Append `row_id` under the field/value bucket.
    pub fn insert(&mut self, field: &str, value: &str, row_id: RowId) {
        let bucket = self
            .postings
            .entry(field.to_lowercase())
            .or_default()
            .entry(Self::normalize_value(value))
            .or_default();

        // IDs arrive in ascending file order, so a tail check is enough to
        // keep one posting per row per pass
        if bucket.last() != Some(&row_id) {
            bucket.push(row_id);
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.postings.contains_key(&field.to_lowercase())
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.postings.keys()
    }

    pub fn field_count(&self) -> usize {
        self.postings.len()
    }

    /// Total number of value buckets across all fields.
    pub fn distinct_value_count(&self) -> usize {
        self.postings.values().map(|buckets| buckets.len()).sum()
    }

    pub fn lookup_exact(&self, field: &str, value: &str) -> Option<&Vec<RowId>> {
        self.postings
            .get(&field.to_lowercase())?
            .get(&Self::normalize_value(value))
    }

    /// Row IDs under value keys strictly below `bound`.
    ///
    /// Keys compare as strings, not as parsed numbers or dates. The executor
    /// corrects for that with a typed per-row recheck, so this stage only
    /// has to be a superset-ish approximation of the right answer.
    pub fn lookup_less_than(&self, field: &str, bound: &str) -> Vec<RowId> {
        self.collect_matching(field, |key| key < bound)
    }

    /// Row IDs under value keys strictly above `bound`, same string-ordering
    /// caveat as `lookup_less_than`.
    pub fn lookup_greater_than(&self, field: &str, bound: &str) -> Vec<RowId> {
        self.collect_matching(field, |key| key > bound)
    }

    /// Row IDs under value keys within `[low, high]`, inclusive, again by
    /// string comparison.
    pub fn lookup_range(&self, field: &str, low: &str, high: &str) -> Vec<RowId> {
        self.collect_matching(field, |key| key >= low && key <= high)
    }

    fn collect_matching<F>(&self, field: &str, predicate: F) -> Vec<RowId>
    where
        F: Fn(&str) -> bool,
    {
        let mut ids = Vec::new();
        if let Some(buckets) = self.postings.get(&field.to_lowercase()) {
            for (key, rows) in buckets {
                if predicate(key) {
                    ids.extend_from_slice(rows);
                }
            }
        }
        ids
    }

    /// Every value bucket under `field` holding more than one row.
    pub fn duplicates(&self, field: &str) -> HashMap<String, Vec<RowId>> {
        let mut result = HashMap::new();
        if let Some(buckets) = self.postings.get(&field.to_lowercase()) {
            for (key, rows) in buckets {
                if rows.len() > 1 {
                    result.insert(key.clone(), rows.clone());
                }
            }
        }
        result
    }

    /// Rows whose `field` was empty at ingestion time.
    pub fn missing_value_rows(&self, field: &str) -> Vec<RowId> {
        self.lookup_exact(field, "")
            .cloned()
            .unwrap_or_default()
    }

    pub fn unique_values(&self, field: &str) -> HashSet<String> {
        self.postings
            .get(&field.to_lowercase())
            .map(|buckets| buckets.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, field: &str, value: &str) -> usize {
        self.lookup_exact(field, value).map_or(0, |rows| rows.len())
    }

    /// All row IDs under `field`, flattened across buckets and sorted
    /// numerically.
    pub fn sorted_row_ids(&self, field: &str, ascending: bool) -> Vec<RowId> {
        let mut ids = self.collect_matching(field, |_| true);
        ids.sort();
        if !ascending {
            ids.reverse();
        }
        ids
    }

    /// The field with the most distinct values that occur on more than one
    /// row. Ties keep whichever field iteration reaches first; field
    /// iteration order is unspecified.
    pub fn field_with_most_duplicate_values(&self) -> Option<(String, usize)> {
        let mut best: Option<(String, usize)> = None;
        for (field, buckets) in &self.postings {
            let duplicated = buckets.values().filter(|rows| rows.len() > 1).count();
            match &best {
                Some((_, count)) if *count >= duplicated => {}
                _ => best = Some((field.clone(), duplicated)),
            }
        }
        best
    }

    /// Union of postings for every value key within edit distance
    /// `threshold` of `value`. No output ordering is promised.
    pub fn fuzzy_match(&self, field: &str, value: &str, threshold: u8) -> Vec<RowId> {
        let matcher = FuzzyMatcher::new(&Self::normalize_value(value), threshold);
        let mut ids = Vec::new();
        if let Some(buckets) = self.postings.get(&field.to_lowercase()) {
            for (key, rows) in buckets {
                if matcher.matches(key) {
                    ids.extend_from_slice(rows);
                }
            }
        }
        ids
    }
}
