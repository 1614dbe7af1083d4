use crate::core::error::{Error, ErrorKind, Result};
use crate::query::types::{Operator, QueryCondition};

/// Parser for the small textual condition language.
///
/// Clauses are joined by the literal token `and`, split naively by
/// substring: an `and` inside a field name or value corrupts the split.
/// That is a documented limitation kept for compatibility, not fixed here.
///
/// Each clause is classified by the first delimiter it contains, in fixed
/// priority order: `<`, then `>`, then `=`, then `..`. Range clauses must
/// split into exactly three non-empty parts (`field..low..high`) or the
/// clause is dropped. Conditions are implicitly AND-ed; there is no OR/NOT.
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        QueryParser
    }

    /// Parse a query string into an ordered list of conditions.
    /// A query yielding zero valid conditions is an error, not an empty list.
    pub fn parse(&self, input: &str) -> Result<Vec<QueryCondition>> {
        let lowered = input.to_lowercase();

        let mut conditions = Vec::new();
        for clause in lowered.split("and") {
            if let Some(condition) = Self::parse_clause(clause) {
                conditions.push(condition);
            }
        }

        if conditions.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidQuery,
                format!("no valid conditions in query '{}'", input),
            ));
        }
        Ok(conditions)
    }

    fn parse_clause(clause: &str) -> Option<QueryCondition> {
        if let Some((field, value)) = clause.split_once('<') {
            return Some(QueryCondition::new(
                field.trim().to_string(),
                Operator::LessThan(value.trim().to_string()),
            ));
        }
        if let Some((field, value)) = clause.split_once('>') {
            return Some(QueryCondition::new(
                field.trim().to_string(),
                Operator::GreaterThan(value.trim().to_string()),
            ));
        }
        if let Some((field, value)) = clause.split_once('=') {
            return Some(QueryCondition::new(
                field.trim().to_string(),
                Operator::Equals(value.trim().to_string()),
            ));
        }
        if clause.contains("..") {
            let parts: Vec<&str> = clause.split("..").map(str::trim).collect();
            if parts.len() == 3 && parts.iter().all(|part| !part.is_empty()) {
                return Some(QueryCondition::new(
                    parts[0].to_string(),
                    Operator::Range(parts[1].to_string(), parts[2].to_string()),
                ));
            }
            return None;
        }
        None
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}
