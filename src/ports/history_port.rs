//! Durable history store port.

use crate::domain::error::MarketGraphError;
use crate::domain::history::HistoryStore;

pub trait HistoryPort {
    /// Load the persisted store. A store that was never written loads as empty;
    /// unreadable or unparseable data is an error the caller may downgrade.
    fn load(&self) -> Result<HistoryStore, MarketGraphError>;

    /// Overwrite the persisted store.
    fn save(&self, history: &HistoryStore) -> Result<(), MarketGraphError>;
}
