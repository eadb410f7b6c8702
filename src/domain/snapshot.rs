//! Point-in-time price snapshot handed to the core by a collector.
//!
//! Entries keep the collector's order. Ids are unique: inserting an id that is
//! already present replaces its reading but keeps its original position.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub timestamp: String,
    pub volume: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: SnapshotEntry) {
        match self.index.get(&entry.id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&SnapshotEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SnapshotEntry> for Snapshot {
    fn from_iter<I: IntoIterator<Item = SnapshotEntry>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for entry in iter {
            snapshot.insert(entry);
        }
        snapshot
    }
}

/// True when the reading honours the collector contract: price strictly
/// inside (0, 1) and a finite, non-negative volume.
pub fn is_valid_reading(price: f64, volume: f64) -> bool {
    price.is_finite() && price > 0.0 && price < 1.0 && volume.is_finite() && volume >= 0.0
}
