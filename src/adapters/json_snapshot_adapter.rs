//! JSON file snapshot source: the collector's own dump format,
//! `{"<id>": {"title": ..., "price": ..., "timestamp": ..., "volume": ...}}`.

use crate::adapters::snapshot_reading::RawReading;
use crate::domain::error::MarketGraphError;
use crate::domain::snapshot::Snapshot;
use crate::ports::snapshot_port::SnapshotSource;
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Untyped readings in document order.
struct OrderedReadings(Vec<(String, serde_json::Value)>);

struct OrderedReadingsVisitor;

impl<'de> Visitor<'de> for OrderedReadingsVisitor {
    type Value = OrderedReadings;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of instrument id to reading")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut readings = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(pair) = access.next_entry::<String, serde_json::Value>()? {
            readings.push(pair);
        }
        Ok(OrderedReadings(readings))
    }
}

impl<'de> Deserialize<'de> for OrderedReadings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedReadingsVisitor)
    }
}

pub struct JsonSnapshotAdapter {
    path: PathBuf,
    fetched_at: String,
}

impl JsonSnapshotAdapter {
    pub fn new(path: PathBuf, fetched_at: String) -> Self {
        Self { path, fetched_at }
    }
}

impl SnapshotSource for JsonSnapshotAdapter {
    fn fetch(&self) -> Result<Snapshot, MarketGraphError> {
        let read_err = |reason: String| MarketGraphError::SnapshotRead {
            source_name: self.path.display().to_string(),
            reason,
        };

        let content = fs::read_to_string(&self.path).map_err(|e| read_err(e.to_string()))?;
        let OrderedReadings(readings) =
            serde_json::from_str(&content).map_err(|e| read_err(e.to_string()))?;

        let snapshot: Snapshot = readings
            .into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<RawReading>(value) {
                Ok(mut raw) => {
                    raw.id = id;
                    raw.into_entry(&self.fetched_at)
                }
                Err(e) => {
                    warn!(id = %id, "skipping malformed snapshot entry: {e}");
                    None
                }
            })
            .collect();

        debug!(
            markets = snapshot.len(),
            "read snapshot from {}",
            self.path.display()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn adapter_for(content: &str) -> (TempDir, JsonSnapshotAdapter) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, content).unwrap();
        (dir, JsonSnapshotAdapter::new(path, "fetched".into()))
    }

    #[test]
    fn reads_collector_dump() {
        let (_dir, adapter) = adapter_for(
            r#"{
                "z9": {"title": "Last alphabetically", "price": 0.7, "timestamp": "t0", "volume": 5},
                "a1": {"title": "First alphabetically", "price": 0.2, "volume": 9.5}
            }"#,
        );
        let snapshot = adapter.fetch().unwrap();

        let ids: Vec<_> = snapshot.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["z9", "a1"]);
        assert_eq!(snapshot.get("z9").unwrap().timestamp, "t0");
        assert_eq!(snapshot.get("a1").unwrap().timestamp, "fetched");
    }

    #[test]
    fn drops_invalid_entries() {
        let (_dir, adapter) = adapter_for(
            r#"{"a": {"title": "A", "price": 0.0}, "b": {"title": "B", "price": 0.4}}"#,
        );
        let snapshot = adapter.fetch().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("b").is_some());
    }

    #[test]
    fn skips_entries_with_wrong_field_types() {
        let (_dir, adapter) = adapter_for(
            r#"{
                "good": {"title": "Good", "price": 0.4, "volume": 1},
                "quoted": {"title": "Quoted price", "price": "0.5", "volume": 1},
                "numeric_title": {"title": 7, "price": 0.6},
                "scalar": 0.3
            }"#,
        );
        let snapshot = adapter.fetch().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("good").unwrap().price, 0.4);
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let (_dir, adapter) = adapter_for("[]");
        assert!(matches!(
            adapter.fetch(),
            Err(MarketGraphError::SnapshotRead { .. })
        ));
    }
}
