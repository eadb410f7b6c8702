//! Row shape shared by the file snapshot adapters.

use crate::domain::snapshot::{SnapshotEntry, is_valid_reading};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub id: String,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub timestamp: Option<String>,
    pub volume: Option<f64>,
}

impl RawReading {
    /// Convert to a snapshot entry, or `None` if the reading breaks the
    /// collector contract. Missing timestamps take `fetched_at`.
    pub fn into_entry(self, fetched_at: &str) -> Option<SnapshotEntry> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            warn!("dropping reading without an id");
            return None;
        }

        let Some(price) = self.price else {
            warn!(id = %id, "dropping reading without a price");
            return None;
        };
        let volume = self.volume.unwrap_or(0.0);
        if !is_valid_reading(price, volume) {
            warn!(id = %id, price, volume, "dropping reading outside (0,1) price or with negative volume");
            return None;
        }

        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Market {id}"));
        let timestamp = self
            .timestamp
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| fetched_at.to_string());

        Some(SnapshotEntry {
            id,
            title,
            price,
            timestamp,
            volume,
        })
    }
}
