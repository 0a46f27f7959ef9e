//! The resource mutation engine
//!
//! Edit/validate/commit machinery: the [`Diagnosis`] accumulator, the
//! declarative [`ConstraintSet`] checker, URI minting and created-node
//! location, the edit-context state machine, the creation protocol
//! helpers, and the cross-process [`LockManager`].

pub mod constraints;
pub mod creation;
pub mod diagnosis;
pub mod edit;
pub mod identity;
pub mod lock;

pub use constraints::{Cardinality, ConstraintSet, NodeKind, TypedProperty};
pub use creation::CreatedNode;
pub use diagnosis::Diagnosis;
pub use edit::{EditState, EditTracker};
pub use lock::{LockGuard, LockManager};

use crate::rdf::TermError;
use crate::store::StoreError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Call-level parameters of a façade operation.
///
/// Ordered so nested trusted edits can compare them for equality.
pub type Parameters = BTreeMap<String, String>;

/// Engine errors, one variant per failure kind of the mutation
/// protocol. Structural problems carry the full [`Diagnosis`] so a
/// caller sees every violated rule at once.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The proposed graph violates structural constraints
    #[error("Invalid graph: {0}")]
    Invalid(Diagnosis),

    /// The posted graph declares no type recognized by the container
    #[error("No recognized type for posted resource in {0}")]
    NoRecognizedType(String),

    /// The posted graph declares more than one recognized type
    #[error("Ambiguous type for posted resource: {0}")]
    AmbiguousType(String),

    /// A concrete URI supplied for creation is already in use
    #[error("URI already in use: {0}")]
    IdentityConflict(String),

    /// The created node could not be located in the posted graph
    #[error("Created node not found in posted graph")]
    CreatedNotFound,

    /// Illegal nesting of edit sessions; an integration bug, not a
    /// data problem
    #[error("Edit protocol violation: {0}")]
    ProtocolViolation(String),

    /// A lock could not be obtained within the timeout; retryable by
    /// the caller, never retried by the engine
    #[error("Resource is busy: {0}")]
    Contention(String),

    /// No resource is registered under this URI
    #[error("No such resource: {0}")]
    NotFound(String),

    /// The resource existed but has been deleted; the handle is dead
    #[error("Resource has been deleted: {0}")]
    Deleted(String),

    /// An unrecognized call-level parameter was supplied
    #[error("Unrecognized parameter: {0}")]
    UnrecognizedParameter(String),

    /// The underlying store failed; a best-effort rollback was
    /// attempted
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// Invalid RDF term
    #[error("Invalid term: {0}")]
    Term(#[from] TermError),

    /// Lock file I/O failure
    #[error("Lock I/O failure: {0}")]
    LockIo(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
