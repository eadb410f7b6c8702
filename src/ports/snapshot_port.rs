//! Market snapshot source port.

use crate::domain::error::MarketGraphError;
use crate::domain::snapshot::Snapshot;

/// Produces one validated snapshot per run.
pub trait SnapshotSource {
    fn fetch(&self) -> Result<Snapshot, MarketGraphError>;
}
