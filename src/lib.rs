//! tracebase — transactional, constraint-checked resource engine over
//! an RDF triple store.
//!
//! Resources (trace bases, trace models, stored traces) each own one
//! public graph and one metadata graph in a multi-graph store. Every
//! mutation runs a uniform pipeline: lock, edit session, structural
//! constraint check, kind-specific semantic check, minimal delta,
//! metadata stamping, single commit. Rejections report every violated
//! rule at once and leave the store untouched.
//!
//! The main entry point is [`service::Repository`]; [`kind`] holds the
//! resource-class collaborators, [`engine`] the validation and
//! protocol machinery, [`rdf`] and [`store`] the data layer.

pub mod config;
pub mod engine;
pub mod kind;
pub mod rdf;
pub mod service;
pub mod store;

pub use config::ServiceConfig;
pub use engine::{Diagnosis, EngineError, EngineResult, Parameters};
pub use rdf::{Graph, NamedNode, Triple};
pub use service::Repository;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate version as reported to clients
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_version_matches_manifest() {
        assert_eq!(super::version(), env!("CARGO_PKG_VERSION"));
    }
}
