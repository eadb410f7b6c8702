//! JSON file graph sink. Each save fully replaces the file.

use crate::adapters::atomic_file::write_atomic;
use crate::domain::error::MarketGraphError;
use crate::domain::graph::Graph;
use crate::ports::config_port::ConfigPort;
use crate::ports::graph_port::GraphSink;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_GRAPH_PATH: &str = "graph_data.json";

pub struct JsonGraphAdapter {
    path: PathBuf,
}

impl JsonGraphAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let path = config
            .get_string("graph", "path")
            .unwrap_or_else(|| DEFAULT_GRAPH_PATH.to_string());
        Self::new(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphSink for JsonGraphAdapter {
    fn save(&self, graph: &Graph) -> Result<(), MarketGraphError> {
        let json = serde_json::to_string_pretty(graph).map_err(|e| MarketGraphError::Persist {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.path, &json)?;
        debug!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            "saved graph to {}",
            self.path.display()
        );
        Ok(())
    }
}
