#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use marketgraph::domain::error::MarketGraphError;
use marketgraph::domain::graph::Graph;
use marketgraph::domain::history::{HistoryRecord, HistoryStore, PricePoint};
pub use marketgraph::domain::snapshot::{Snapshot, SnapshotEntry};
use marketgraph::ports::graph_port::GraphSink;
use marketgraph::ports::history_port::HistoryPort;
use marketgraph::ports::snapshot_port::SnapshotSource;
use std::cell::{Cell, RefCell};

/// In-memory history store with switchable failures.
pub struct MemoryHistoryPort {
    pub stored: RefCell<Option<HistoryStore>>,
    pub corrupt: bool,
    pub fail_save: bool,
    pub saves: Cell<usize>,
}

impl MemoryHistoryPort {
    pub fn new() -> Self {
        Self {
            stored: RefCell::new(None),
            corrupt: false,
            fail_save: false,
            saves: Cell::new(0),
        }
    }

    pub fn with_history(history: HistoryStore) -> Self {
        let port = Self::new();
        *port.stored.borrow_mut() = Some(history);
        port
    }

    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new()
        }
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn current(&self) -> Option<HistoryStore> {
        self.stored.borrow().clone()
    }
}

impl HistoryPort for MemoryHistoryPort {
    fn load(&self) -> Result<HistoryStore, MarketGraphError> {
        if self.corrupt {
            return Err(MarketGraphError::HistoryCorrupt {
                path: "memory".into(),
                reason: "unexpected end of input".into(),
            });
        }
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, history: &HistoryStore) -> Result<(), MarketGraphError> {
        if self.fail_save {
            return Err(MarketGraphError::Persist {
                path: "memory".into(),
                reason: "read-only".into(),
            });
        }
        self.saves.set(self.saves.get() + 1);
        *self.stored.borrow_mut() = Some(history.clone());
        Ok(())
    }
}

pub struct MockSnapshotSource {
    pub snapshot: Snapshot,
    pub error: Option<String>,
}

impl MockSnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            snapshot: Snapshot::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl SnapshotSource for MockSnapshotSource {
    fn fetch(&self) -> Result<Snapshot, MarketGraphError> {
        match &self.error {
            Some(reason) => Err(MarketGraphError::SnapshotRead {
                source_name: "mock".into(),
                reason: reason.clone(),
            }),
            None => Ok(self.snapshot.clone()),
        }
    }
}

pub struct MemoryGraphSink {
    pub saved: RefCell<Option<Graph>>,
    pub fail: bool,
    pub saves: Cell<usize>,
}

impl MemoryGraphSink {
    pub fn new() -> Self {
        Self {
            saved: RefCell::new(None),
            fail: false,
            saves: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn graph(&self) -> Option<Graph> {
        self.saved.borrow().clone()
    }
}

impl GraphSink for MemoryGraphSink {
    fn save(&self, graph: &Graph) -> Result<(), MarketGraphError> {
        if self.fail {
            return Err(MarketGraphError::Persist {
                path: "memory".into(),
                reason: "no space left on device".into(),
            });
        }
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(graph.clone());
        Ok(())
    }
}

pub fn make_record(title: &str, prices: &[f64]) -> HistoryRecord {
    HistoryRecord {
        title: title.to_string(),
        prices: prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint {
                t: format!("2024-03-01T{:02}:00:00", i % 24),
                p,
            })
            .collect(),
    }
}

/// History with one record per `(id, prices)`, titled `"Title <id>"`.
pub fn make_history(series: &[(&str, &[f64])]) -> HistoryStore {
    let mut history = HistoryStore::new();
    for &(id, prices) in series {
        history.insert(id, make_record(&format!("Title {id}"), prices));
    }
    history
}

pub fn make_snapshot(readings: &[(&str, f64)], timestamp: &str) -> Snapshot {
    readings
        .iter()
        .map(|&(id, price)| SnapshotEntry {
            id: id.to_string(),
            title: format!("Title {id}"),
            price,
            timestamp: timestamp.to_string(),
            volume: 1000.0,
        })
        .collect()
}

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub const RISING: &[f64] = &[0.1, 0.2, 0.3, 0.4, 0.5];
pub const FALLING: &[f64] = &[0.5, 0.4, 0.3, 0.2, 0.1];
