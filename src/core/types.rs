use serde::{Serialize, Deserialize};
use chrono::NaiveDate;

/// Row IDs are 1-based spreadsheet row numbers: the header line occupies
/// row 1, so the first data record gets ID 2.
pub const FIRST_DATA_ROW: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl RowId {
    pub fn new(id: u64) -> Self {
        RowId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        RowId(id)
    }
}

/// Typed field value. Tokenization lowercases everything before detection,
/// so `Text` never carries the original casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Empty,
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

/// One decoded record: field values in header order plus the duplicate flag
/// set by downstream analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub fields: Vec<(String, FieldValue)>,
    pub duplicate: bool,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Row {
            id,
            fields: Vec::new(),
            duplicate: false,
        }
    }

    pub fn add_field(&mut self, name: String, value: FieldValue) {
        self.fields.push((name, value));
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}
