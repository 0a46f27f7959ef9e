//! Base resource kind
//!
//! A lock-protected container of trace models, stored traces, and
//! nested bases. Cannot be deleted while it still contains anything.

use super::{ConstraintCache, ResourceKind};
use crate::engine::{ConstraintSet, Diagnosis};
use crate::rdf::{vocab, Graph, NamedNode, Triple};

/// The trace-base container kind
pub struct BaseKind {
    constraints: ConstraintCache,
}

impl BaseKind {
    pub const fn new() -> Self {
        Self {
            constraints: ConstraintCache::new(),
        }
    }
}

impl ResourceKind for BaseKind {
    fn name(&self) -> &'static str {
        "Base"
    }

    fn rdf_type(&self) -> NamedNode {
        vocab::tb_base()
    }

    fn uri_prefix(&self) -> &'static str {
        "base"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn lock_protected(&self) -> bool {
        true
    }

    fn child_kinds(&self) -> &'static [&'static dyn ResourceKind] {
        super::base_children()
    }

    fn constraints(&self) -> &ConstraintSet {
        self.constraints.get_or_init(|| {
            let core = super::core_fragment();
            ConstraintSet::merged(&[&core])
        })
    }

    fn check_deletable(&self, uri: &NamedNode, graph: &Graph) -> Diagnosis {
        super::check_container_empty(self.name(), uri, graph)
    }

    fn ack_new_child(&self, parent: &NamedNode, child: &NamedNode) -> Vec<Triple> {
        super::contains_edge(parent, child)
    }
}
