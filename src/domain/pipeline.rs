//! Run orchestration: load, merge, persist, correlate, build, persist.
//!
//! Nothing here fails. Collector and persistence problems are logged and
//! reflected in the returned summary; degenerate data only shrinks the graph.

use crate::domain::correlation::{self, DEFAULT_MIN_SAMPLES};
use crate::domain::graph::{self, DEFAULT_MIN_CORRELATION, Graph};
use crate::domain::history::{self, DEFAULT_WINDOW_MAX, HistoryStore};
use crate::ports::graph_port::GraphSink;
use crate::ports::history_port::HistoryPort;
use crate::ports::snapshot_port::SnapshotSource;
use chrono::NaiveDateTime;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum retained points per instrument.
    pub window_max: usize,
    /// Minimum points before an instrument enters the correlation matrix.
    pub min_samples: usize,
    /// Inclusive lower bound on |correlation| for a link.
    pub min_correlation: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_max: DEFAULT_WINDOW_MAX,
            min_samples: DEFAULT_MIN_SAMPLES,
            min_correlation: DEFAULT_MIN_CORRELATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Instruments in the retained history after the run.
    pub instruments: usize,
    /// Instruments that received a new point this run.
    pub updated: usize,
    pub nodes: usize,
    pub links: usize,
    /// Whether the history was written. Always false for a rebuild.
    pub history_saved: bool,
    pub graph_saved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The collector produced nothing; persisted state was left untouched.
    NoData,
    Completed(RunSummary),
}

pub fn iso_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Load the persisted history, falling back to an empty store on any error.
pub fn load_history_or_empty(port: &dyn HistoryPort) -> HistoryStore {
    match port.load() {
        Ok(history) => {
            info!(instruments = history.len(), "loaded history");
            history
        }
        Err(e) => {
            warn!("starting from empty history: {e}");
            HistoryStore::new()
        }
    }
}

/// Correlate the retained history and build the graph stamped `last_updated`.
pub fn derive_graph(history: &HistoryStore, config: &PipelineConfig, last_updated: &str) -> Graph {
    let matrix = correlation::compute(history, config.min_samples);
    graph::build(
        matrix.as_ref(),
        history,
        config.min_correlation,
        last_updated,
    )
}

fn save_graph(sink: &dyn GraphSink, graph: &Graph) -> bool {
    match sink.save(graph) {
        Ok(()) => true,
        Err(e) => {
            error!("saving graph: {e}");
            false
        }
    }
}

/// One full run against a fresh snapshot.
pub fn run(
    history_port: &dyn HistoryPort,
    source: &dyn SnapshotSource,
    sink: &dyn GraphSink,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> RunOutcome {
    let history = load_history_or_empty(history_port);

    let snapshot = match source.fetch() {
        Ok(s) => s,
        Err(e) => {
            warn!("collector failed: {e}");
            return RunOutcome::NoData;
        }
    };
    if snapshot.is_empty() {
        warn!("no data fetched; history and graph left untouched");
        return RunOutcome::NoData;
    }
    info!(markets = snapshot.len(), "snapshot received");

    let history = history::update(history, &snapshot, config.window_max);

    let history_saved = match history_port.save(&history) {
        Ok(()) => true,
        Err(e) => {
            error!("saving history: {e}");
            false
        }
    };

    let graph = derive_graph(&history, config, &iso_timestamp(now));
    let graph_saved = save_graph(sink, &graph);

    let summary = RunSummary {
        instruments: history.len(),
        updated: snapshot.len(),
        nodes: graph.node_count(),
        links: graph.link_count(),
        history_saved,
        graph_saved,
    };
    info!(
        nodes = summary.nodes,
        links = summary.links,
        "update complete"
    );
    RunOutcome::Completed(summary)
}

/// Recompute the graph from the persisted history without a new snapshot.
/// The history itself is not rewritten.
pub fn rebuild(
    history_port: &dyn HistoryPort,
    sink: &dyn GraphSink,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> RunSummary {
    let history = load_history_or_empty(history_port);
    let graph = derive_graph(&history, config, &iso_timestamp(now));
    let graph_saved = save_graph(sink, &graph);

    info!(
        nodes = graph.node_count(),
        links = graph.link_count(),
        "graph rebuilt"
    );
    RunSummary {
        instruments: history.len(),
        updated: 0,
        nodes: graph.node_count(),
        links: graph.link_count(),
        history_saved: false,
        graph_saved,
    }
}
