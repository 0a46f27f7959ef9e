//! In-memory store with an undo journal
//!
//! Every mutation since the last commit is journaled; rollback replays
//! the journal in reverse. Commit simply truncates the journal.

use super::{StoreError, StoreResult, TripleStore};
use crate::rdf::{Graph, Triple, TriplePattern};
use std::collections::HashMap;
use tracing::debug;

/// One undoable mutation
enum JournalOp {
    Inserted { graph_id: String, triple: Triple },
    Removed { graph_id: String, triple: Triple },
    Dropped { graph_id: String, graph: Graph },
}

/// In-memory multi-graph store
#[derive(Default)]
pub struct MemoryStore {
    graphs: HashMap<String, Graph>,
    journal: Vec<JournalOp>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of named graphs
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    /// Whether there are uncommitted changes
    pub fn is_dirty(&self) -> bool {
        !self.journal.is_empty()
    }
}

impl TripleStore for MemoryStore {
    fn insert(&mut self, graph_id: &str, triple: Triple) -> StoreResult<bool> {
        let graph = self.graphs.entry(graph_id.to_string()).or_default();
        let inserted = graph.insert(triple.clone());
        if inserted {
            self.journal.push(JournalOp::Inserted {
                graph_id: graph_id.to_string(),
                triple,
            });
        }
        Ok(inserted)
    }

    fn remove(&mut self, graph_id: &str, pattern: &TriplePattern) -> StoreResult<usize> {
        let graph = match self.graphs.get_mut(graph_id) {
            Some(g) => g,
            None => return Ok(0),
        };
        let doomed = graph.matching(pattern);
        for triple in &doomed {
            graph.remove(triple);
            self.journal.push(JournalOp::Removed {
                graph_id: graph_id.to_string(),
                triple: triple.clone(),
            });
        }
        Ok(doomed.len())
    }

    fn triples(&self, graph_id: &str, pattern: &TriplePattern) -> Vec<Triple> {
        self.graphs
            .get(graph_id)
            .map(|g| g.matching(pattern))
            .unwrap_or_default()
    }

    fn graph(&self, graph_id: &str) -> Option<&Graph> {
        self.graphs.get(graph_id)
    }

    fn contains_graph(&self, graph_id: &str) -> bool {
        self.graphs.contains_key(graph_id)
    }

    fn drop_graph(&mut self, graph_id: &str) -> StoreResult<()> {
        let graph = self
            .graphs
            .remove(graph_id)
            .ok_or_else(|| StoreError::GraphNotFound(graph_id.to_string()))?;
        self.journal.push(JournalOp::Dropped {
            graph_id: graph_id.to_string(),
            graph,
        });
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        debug!(ops = self.journal.len(), "committing store batch");
        self.journal.clear();
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        debug!(ops = self.journal.len(), "rolling back store batch");
        while let Some(op) = self.journal.pop() {
            match op {
                JournalOp::Inserted { graph_id, triple } => {
                    if let Some(g) = self.graphs.get_mut(&graph_id) {
                        g.remove(&triple);
                    }
                }
                JournalOp::Removed { graph_id, triple } => {
                    self.graphs.entry(graph_id).or_default().insert(triple);
                }
                JournalOp::Dropped { graph_id, graph } => {
                    self.graphs.insert(graph_id, graph);
                }
            }
        }
        Ok(())
    }
}
