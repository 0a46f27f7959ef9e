//! Resource kinds
//!
//! Each concrete resource class implements [`ResourceKind`]: its RDF
//! type, its constraint set, and the hooks the engine calls around
//! creation, edit and deletion. Constraint sets are assembled once per
//! kind by unioning declared capability fragments — plain data, no
//! inheritance.

mod base;
mod model;
mod root;
mod trace;

pub use base::BaseKind;
pub use model::TraceModelKind;
pub use root::RootKind;
pub use trace::StoredTraceKind;

use crate::engine::{ConstraintSet, Diagnosis};
use crate::rdf::{vocab, Graph, NamedNode, Triple};
use std::sync::OnceLock;

/// Contract between the engine and a concrete resource class.
pub trait ResourceKind: Send + Sync {
    /// Implementation-kind tag, stored in the metadata graph
    fn name(&self) -> &'static str;

    /// The kind's own declared RDF type
    fn rdf_type(&self) -> NamedNode;

    /// Prefix used when minting child-free URIs for this kind
    fn uri_prefix(&self) -> &'static str;

    /// Whether resources of this kind hold children
    fn is_container(&self) -> bool {
        false
    }

    /// Whether mutations must serialize through the lock manager
    fn lock_protected(&self) -> bool {
        false
    }

    /// Kinds accepted as children, keyed by their rdf:type
    fn child_kinds(&self) -> &'static [&'static dyn ResourceKind] {
        &[]
    }

    /// Recognized call-level parameters, per operation
    fn recognized_post_parameters(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn recognized_edit_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn recognized_get_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    fn recognized_delete_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    /// The kind's merged constraint set (computed once, then cached)
    fn constraints(&self) -> &ConstraintSet;

    /// Fill kind-specific derived fields before a graph is checked
    fn complete_new_graph(&self, _uri: &NamedNode, _graph: &mut Graph) {}

    /// Kind-specific semantic checks, folded into the same Diagnosis
    /// pass as the structural constraints
    fn check_extra(&self, _uri: &NamedNode, _graph: &Graph) -> Diagnosis {
        Diagnosis::new(self.name())
    }

    /// Veto deletion (e.g. a container that still has children)
    fn check_deletable(&self, _uri: &NamedNode, _graph: &Graph) -> Diagnosis {
        Diagnosis::new(self.name())
    }

    /// Snapshot auxiliary state when an edit scope opens
    fn prepare_edit(&self, _uri: &NamedNode, _graph: &Graph) {}

    /// Kind-specific bookkeeping after a successful edit, before the
    /// metadata graph is refreshed
    fn ack_edit(&self, _uri: &NamedNode, _graph: &Graph) {}

    /// Kind-specific bookkeeping after a deletion is committed
    fn ack_delete(&self, _uri: &NamedNode) {}

    /// Triples to add to the parent's graph when a child is created,
    /// applied under the same storage transaction as the child
    fn ack_new_child(&self, _parent: &NamedNode, _child: &NamedNode) -> Vec<Triple> {
        Vec::new()
    }
}

// Capability fragments, unioned per kind.

/// Every kind: the trace-base namespace is reserved. Posted graphs
/// legitimately link the new resource from its container, so the
/// incoming contains-edge is creation-exempt.
pub(crate) fn core_fragment() -> ConstraintSet {
    let mut set = ConstraintSet::default();
    set.reserved_prefixes.push(vocab::TB_NS.to_string());
    set.create_exempt_in
        .insert(vocab::tb_contains().as_str().to_string());
    set
}

/// Containers acknowledge children with a contains-edge.
pub(crate) fn contains_edge(parent: &NamedNode, child: &NamedNode) -> Vec<Triple> {
    vec![Triple::new(
        parent.clone(),
        vocab::tb_contains(),
        child.clone(),
    )]
}

/// Deletion veto shared by all containers.
pub(crate) fn check_container_empty(kind_name: &str, uri: &NamedNode, graph: &Graph) -> Diagnosis {
    let mut diag = Diagnosis::new(kind_name);
    let children = graph.objects_for(
        &crate::rdf::Subject::Named(uri.clone()),
        &vocab::tb_contains(),
    );
    if !children.is_empty() {
        diag.append(format!(
            "non-empty {} can not be deleted: <{}> still contains {} resource(s)",
            kind_name.to_lowercase(),
            uri.as_str(),
            children.len()
        ));
    }
    diag
}

pub(crate) type ConstraintCache = OnceLock<ConstraintSet>;

// Kind singletons. Trait objects over these are what the engine and
// the service pass around.

pub static ROOT: RootKind = RootKind::new();
pub static BASE: BaseKind = BaseKind::new();
pub static TRACE_MODEL: TraceModelKind = TraceModelKind::new();
pub static STORED_TRACE: StoredTraceKind = StoredTraceKind::new();

static ROOT_CHILDREN: [&dyn ResourceKind; 1] = [&BASE];
static BASE_CHILDREN: [&dyn ResourceKind; 3] = [&BASE, &TRACE_MODEL, &STORED_TRACE];

pub(crate) fn root_children() -> &'static [&'static dyn ResourceKind] {
    &ROOT_CHILDREN
}

pub(crate) fn base_children() -> &'static [&'static dyn ResourceKind] {
    &BASE_CHILDREN
}

/// Look a kind up by its implementation tag
pub fn by_name(name: &str) -> Option<&'static dyn ResourceKind> {
    match name {
        "Root" => Some(&ROOT),
        "Base" => Some(&BASE),
        "TraceModel" => Some(&TRACE_MODEL),
        "StoredTrace" => Some(&STORED_TRACE),
        _ => None,
    }
}
