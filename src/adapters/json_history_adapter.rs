//! JSON file history store.
//!
//! File shape: `{"<id>": {"title": "...", "prices": [{"t": "...", "p": 0.42}]}}`,
//! pretty-printed, key order preserved.

use crate::adapters::atomic_file::write_atomic;
use crate::domain::error::MarketGraphError;
use crate::domain::history::HistoryStore;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_HISTORY_PATH: &str = "data_history.json";

pub struct JsonHistoryAdapter {
    path: PathBuf,
}

impl JsonHistoryAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let path = config
            .get_string("history", "path")
            .unwrap_or_else(|| DEFAULT_HISTORY_PATH.to_string());
        Self::new(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryPort for JsonHistoryAdapter {
    fn load(&self) -> Result<HistoryStore, MarketGraphError> {
        if !self.path.exists() {
            info!("no history file at {}, starting fresh", self.path.display());
            return Ok(HistoryStore::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| MarketGraphError::HistoryRead {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| MarketGraphError::HistoryCorrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&self, history: &HistoryStore) -> Result<(), MarketGraphError> {
        let json = serde_json::to_string_pretty(history).map_err(|e| MarketGraphError::Persist {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.path, &json)?;
        debug!(
            instruments = history.len(),
            "saved history to {}",
            self.path.display()
        );
        Ok(())
    }
}
