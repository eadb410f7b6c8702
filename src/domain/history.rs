//! Retained per-instrument price history and the snapshot merge.
//!
//! The store is insertion-ordered: the first time an id is seen fixes its
//! position, and that order is preserved through (de)serialization. Records
//! are never removed.

use crate::domain::snapshot::Snapshot;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_WINDOW_MAX: usize = 336;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub t: String,
    pub p: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub title: String,
    #[serde(default)]
    pub prices: Vec<PricePoint>,
}

impl HistoryRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prices: Vec::new(),
        }
    }

    /// Append a point, then evict the oldest points beyond `window_max`.
    pub fn push_point(&mut self, point: PricePoint, window_max: usize) {
        self.prices.push(point);
        if self.prices.len() > window_max {
            let excess = self.prices.len() - window_max;
            self.prices.drain(..excess);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.prices.len()
    }

    pub fn price_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().map(|pt| pt.p)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStore {
    entries: Vec<(String, HistoryRecord)>,
    index: HashMap<String, usize>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryRecord> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// Insert or replace a record. A replaced record keeps its position.
    pub fn insert(&mut self, id: impl Into<String>, record: HistoryRecord) {
        let id = id.into();
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = record,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, record));
            }
        }
    }

    /// Record for `id`, created with `title` and an empty series if absent.
    pub fn record_mut_or_create(&mut self, id: &str, title: &str) -> &mut HistoryRecord {
        let i = match self.index.get(id) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(id.to_string(), i);
                self.entries.push((id.to_string(), HistoryRecord::new(title)));
                i
            }
        };
        &mut self.entries[i].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HistoryRecord)> {
        self.entries.iter().map(|(id, rec)| (id.as_str(), rec))
    }
}

/// Merge one snapshot into the retained history.
///
/// Every instrument in the snapshot gains exactly one point and is trimmed to
/// the most recent `window_max` points. Instruments missing from the snapshot
/// are left as they are.
pub fn update(mut history: HistoryStore, snapshot: &Snapshot, window_max: usize) -> HistoryStore {
    for entry in snapshot.iter() {
        let record = history.record_mut_or_create(&entry.id, &entry.title);
        record.push_point(
            PricePoint {
                t: entry.timestamp.clone(),
                p: entry.price,
            },
            window_max,
        );
    }
    history
}

impl Serialize for HistoryStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

struct HistoryStoreVisitor;

impl<'de> Visitor<'de> for HistoryStoreVisitor {
    type Value = HistoryStore;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of instrument id to history record")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = HistoryStore::new();
        while let Some((id, record)) = access.next_entry::<String, HistoryRecord>()? {
            store.insert(id, record);
        }
        Ok(store)
    }
}

impl<'de> Deserialize<'de> for HistoryStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HistoryStoreVisitor)
    }
}
