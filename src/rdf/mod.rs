//! RDF primitives for the resource engine
//!
//! Term wrappers around oxrdf, the owned [`Graph`] triple set, and the
//! vocabulary of the reserved trace-base namespace.

mod graph;
mod term;
pub mod vocab;

pub use graph::Graph;
pub use term::{
    BlankNode, Literal, NamedNode, Object, Subject, TermError, TermResult, Triple, TriplePattern,
};
