//! CSV file snapshot source.
//!
//! Expected header: `id,title,price,timestamp,volume`. `title`, `timestamp`
//! and `volume` may be blank. Rows that fail to parse or break the collector
//! contract are skipped with a warning.

use crate::adapters::snapshot_reading::RawReading;
use crate::domain::error::MarketGraphError;
use crate::domain::snapshot::Snapshot;
use crate::ports::snapshot_port::SnapshotSource;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvSnapshotAdapter {
    path: PathBuf,
    fetched_at: String,
}

impl CsvSnapshotAdapter {
    pub fn new(path: PathBuf, fetched_at: String) -> Self {
        Self { path, fetched_at }
    }
}

impl SnapshotSource for CsvSnapshotAdapter {
    fn fetch(&self) -> Result<Snapshot, MarketGraphError> {
        let content = fs::read_to_string(&self.path).map_err(|e| MarketGraphError::SnapshotRead {
            source_name: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut snapshot = Snapshot::new();
        let mut skipped = 0usize;

        for result in rdr.deserialize::<RawReading>() {
            match result {
                Ok(raw) => match raw.into_entry(&self.fetched_at) {
                    Some(entry) => snapshot.insert(entry),
                    None => skipped += 1,
                },
                Err(e) => {
                    warn!("skipping malformed snapshot row: {e}");
                    skipped += 1;
                }
            }
        }

        debug!(
            markets = snapshot.len(),
            skipped,
            "read snapshot from {}",
            self.path.display()
        );
        Ok(snapshot)
    }
}
