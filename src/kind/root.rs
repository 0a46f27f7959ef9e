//! Root resource kind
//!
//! The bootstrap singleton at the service root. Contains bases and is
//! never deletable.

use super::{ConstraintCache, ResourceKind};
use crate::engine::{ConstraintSet, Diagnosis};
use crate::rdf::{vocab, Graph, NamedNode, Triple};

/// The root container kind
pub struct RootKind {
    constraints: ConstraintCache,
}

impl RootKind {
    pub const fn new() -> Self {
        Self {
            constraints: ConstraintCache::new(),
        }
    }
}

impl ResourceKind for RootKind {
    fn name(&self) -> &'static str {
        "Root"
    }

    fn rdf_type(&self) -> NamedNode {
        vocab::tb_root()
    }

    fn uri_prefix(&self) -> &'static str {
        "root"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn lock_protected(&self) -> bool {
        true
    }

    fn child_kinds(&self) -> &'static [&'static dyn ResourceKind] {
        super::root_children()
    }

    fn constraints(&self) -> &ConstraintSet {
        self.constraints.get_or_init(|| {
            let core = super::core_fragment();
            ConstraintSet::merged(&[&core])
        })
    }

    fn check_deletable(&self, uri: &NamedNode, _graph: &Graph) -> Diagnosis {
        let mut diag = Diagnosis::new(self.name());
        diag.append(format!("root <{}> can not be deleted", uri.as_str()));
        diag
    }

    fn ack_new_child(&self, parent: &NamedNode, child: &NamedNode) -> Vec<Triple> {
        super::contains_edge(parent, child)
    }
}
