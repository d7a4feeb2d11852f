//! Query results.

use std::sync::Arc;

use crate::bolt::BoltValue;

/// One result row. Keys are shared by every record of a result.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Arc<[String]>,
    values: Vec<BoltValue>,
}

impl Record {
    pub fn new(keys: Arc<[String]>, values: Vec<BoltValue>) -> Self {
        Self { keys, values }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[BoltValue] {
        &self.values
    }

    /// Value for a column, `None` if the record has no such key.
    pub fn get(&self, key: &str) -> Option<&BoltValue> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.values.get(i))
    }
}

/// Every record returned by one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    keys: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(keys: Vec<String>, records: Vec<Record>) -> Self {
        Self { keys, records }
    }

    /// Build a result from rows of `(key, value)` pairs sharing one key set.
    pub fn from_rows(keys: &[&str], rows: Vec<Vec<BoltValue>>) -> Self {
        let shared: Arc<[String]> = keys.iter().map(|k| k.to_string()).collect();
        let records = rows
            .into_iter()
            .map(|values| Record::new(shared.clone(), values))
            .collect();
        Self::new(shared.to_vec(), records)
    }

    /// Field names announced by the server, even when no rows came back.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
