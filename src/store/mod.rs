//! Abstract multi-graph triple store
//!
//! The engine only assumes per-graph read, add, remove-by-pattern, and
//! batch commit/rollback. Nothing here prescribes a serialization or a
//! persistence technology; [`MemoryStore`] is the reference
//! implementation.

mod memory;

pub use memory::MemoryStore;

use crate::rdf::{Graph, Triple, TriplePattern};
use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Graph not found
    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    /// Backend failure during commit or rollback
    #[error("Store backend failure: {0}")]
    Backend(String),

    /// The backend cannot undo uncommitted changes
    #[error("Store does not support rollback")]
    RollbackUnsupported,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Multi-graph store keyed by resource URI.
///
/// Mutations accumulate in an uncommitted batch until [`commit`] makes
/// them durable or [`rollback`] discards them. Whether `rollback` is
/// actually able to undo changes is backend-specific: a backend
/// without undo support must return [`StoreError::RollbackUnsupported`]
/// rather than pretend, and callers treat rollback as best-effort
/// defense in depth, not as the primary consistency mechanism.
pub trait TripleStore {
    /// Add a triple to a graph, creating the graph if needed.
    /// Returns false if the triple was already present.
    fn insert(&mut self, graph_id: &str, triple: Triple) -> StoreResult<bool>;

    /// Remove every triple matching the pattern from a graph.
    /// Returns the number of triples removed.
    fn remove(&mut self, graph_id: &str, pattern: &TriplePattern) -> StoreResult<usize>;

    /// All triples of a graph matching the pattern (empty if the graph
    /// does not exist).
    fn triples(&self, graph_id: &str, pattern: &TriplePattern) -> Vec<Triple>;

    /// Borrow a whole graph, if present
    fn graph(&self, graph_id: &str) -> Option<&Graph>;

    /// Whether a graph exists
    fn contains_graph(&self, graph_id: &str) -> bool;

    /// Remove a graph and all its triples
    fn drop_graph(&mut self, graph_id: &str) -> StoreResult<()>;

    /// Make all uncommitted changes durable
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard all uncommitted changes
    fn rollback(&mut self) -> StoreResult<()>;
}
