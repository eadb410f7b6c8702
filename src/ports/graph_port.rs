//! Graph output port.

use crate::domain::error::MarketGraphError;
use crate::domain::graph::Graph;

pub trait GraphSink {
    /// Replace the persisted graph with `graph`.
    fn save(&self, graph: &Graph) -> Result<(), MarketGraphError>;
}
