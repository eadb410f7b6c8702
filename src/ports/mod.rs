//! Port traits: the seams between the pipeline and its collaborators.

pub mod config_port;
pub mod history_port;
pub mod snapshot_port;
pub mod graph_port;
