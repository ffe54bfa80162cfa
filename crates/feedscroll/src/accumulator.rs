//! Ordered, url-keyed collection of extracted records.

use std::collections::HashSet;

use crate::table::ResultTable;
use crate::types::Record;

/// Growing, deduplicated, insertion-ordered set of records.
///
/// Records are keyed by `url`. Once inserted a record is never replaced,
/// mutated or removed.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    records: Vec<Record>,
    seen: HashSet<String>,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record with this url has been accepted.
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Append records whose url has not been seen, in input order.
    ///
    /// Records with an empty url are ignored. Returns how many were appended.
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = Record>,
    {
        let before = self.records.len();
        for record in records {
            if record.url.is_empty() || self.contains(&record.url) {
                continue;
            }
            self.seen.insert(record.url.clone());
            self.records.push(record);
        }
        self.records.len() - before
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Presentation view with the ten output columns.
    pub fn to_table(&self) -> ResultTable {
        ResultTable::from_records(&self.records)
    }
}

impl<'a> IntoIterator for &'a Accumulator {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
