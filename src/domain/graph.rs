//! Correlation graph: one node per correlated instrument, one link per pair
//! whose correlation magnitude reaches the threshold.

use crate::domain::correlation::CorrelationMatrix;
use crate::domain::history::HistoryStore;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_CORRELATION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub val: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub last_updated: String,
}

impl Graph {
    pub fn empty(last_updated: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            last_updated: last_updated.into(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link(&self, a: &str, b: &str) -> Option<&Link> {
        self.links.iter().find(|l| {
            (l.source == a && l.target == b) || (l.source == b && l.target == a)
        })
    }
}

/// Round to two decimal places, sign preserved.
///
/// Rounds the exact binary value, so `0.015` (stored just below the tie) goes
/// to `0.01`; exact ties such as `0.125` go to the even digit.
pub fn round2(value: f64) -> f64 {
    let r = format!("{value:.2}").parse::<f64>().unwrap_or(value);
    if r == 0.0 { 0.0 } else { r }
}

/// Build the graph for `matrix`. The threshold is inclusive and is applied to
/// the unrounded correlation; undefined pairs never produce a link.
pub fn build(
    matrix: Option<&CorrelationMatrix>,
    history: &HistoryStore,
    threshold: f64,
    last_updated: impl Into<String>,
) -> Graph {
    let mut graph = Graph::empty(last_updated);
    let Some(matrix) = matrix else {
        return graph;
    };

    let ids = matrix.ids();
    graph.nodes = ids
        .iter()
        .map(|id| Node {
            id: id.clone(),
            label: history
                .get(id)
                .map(|rec| rec.title.clone())
                .unwrap_or_else(|| id.clone()),
            val: 1,
        })
        .collect();

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let Some(value) = matrix.get(i, j) else {
                continue;
            };
            if value.abs() >= threshold {
                graph.links.push(Link {
                    source: ids[i].clone(),
                    target: ids[j].clone(),
                    value: round2(value),
                });
            }
        }
    }

    graph
}
