//! Per-URL records and the aggregated result of a run

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{FieldSet, field::URL_KEY};

/// Prefix of the value stored in every field of a failed URL
pub const ERROR_PREFIX: &str = "Error: ";

/// Flat, ordered key/value result for one URL
///
/// The first entry is always `URL`, followed by one entry per field of the
/// run's [`FieldSet`]. Records of the same run share the same keys in the same
/// order, including records of failed URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    entries: Vec<(String, String)>,
    failed: bool,
}

impl Record {
    /// Build a record from extracted `(key, value)` pairs
    pub fn extracted(url: &str, values: Vec<(String, String)>) -> Self {
        let mut entries = Vec::with_capacity(values.len() + 1);
        entries.push((URL_KEY.to_string(), url.to_string()));
        entries.extend(values);
        Self {
            entries,
            failed: false,
        }
    }

    /// Build the placeholder record of a URL that could not be fetched or parsed
    ///
    /// Every field holds `"Error: <description>"`.
    pub fn failed(url: &str, fields: &FieldSet, description: &str) -> Self {
        let marker = format!("{ERROR_PREFIX}{description}");
        let values = fields
            .iter()
            .map(|spec| (spec.key(), marker.clone()))
            .collect();
        Self {
            failed: true,
            ..Self::extracted(url, values)
        }
    }

    /// The URL this record was produced for
    pub fn url(&self) -> &str {
        self.get(URL_KEY).unwrap_or_default()
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Keys in column order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    /// `(key, value)` pairs in column order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Whether this record is an error placeholder
    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Ordered records of one run, one per attempted URL, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunResult {
    records: Vec<Record>,
    #[serde(skip)]
    total: usize,
    #[serde(skip)]
    cancelled: bool,
}

impl RunResult {
    /// Assemble a result from records produced for `total` input URLs
    pub fn new(records: Vec<Record>, total: usize, cancelled: bool) -> Self {
        Self {
            records,
            total,
            cancelled,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of URLs the run was started with
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether the run stopped early because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of error placeholder records
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    /// Column names shared by every record, taken from the first one
    pub fn keys(&self) -> Vec<&str> {
        self.records
            .first()
            .map(|record| record.keys().collect())
            .unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a RunResult {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
