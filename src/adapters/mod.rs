//! Concrete adapter implementations for ports.

pub mod atomic_file;
pub mod csv_snapshot_adapter;
pub mod file_config_adapter;
pub mod json_graph_adapter;
pub mod json_history_adapter;
pub mod json_snapshot_adapter;
pub mod snapshot_reading;

use crate::ports::snapshot_port::SnapshotSource;
use std::path::PathBuf;

/// Snapshot source for a collector output file: `.json` files are read as the
/// collector's JSON dump, anything else as CSV.
pub fn snapshot_source_for(path: PathBuf, fetched_at: String) -> Box<dyn SnapshotSource> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(json_snapshot_adapter::JsonSnapshotAdapter::new(path, fetched_at))
    } else {
        Box::new(csv_snapshot_adapter::CsvSnapshotAdapter::new(path, fetched_at))
    }
}
