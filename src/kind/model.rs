//! Trace-model resource kind

use super::{ConstraintCache, ResourceKind};
use crate::engine::{Cardinality, ConstraintSet, NodeKind, TypedProperty};
use crate::rdf::{vocab, NamedNode};

/// The trace-model kind: a leaf describing obsel types for traces.
pub struct TraceModelKind {
    constraints: ConstraintCache,
}

impl TraceModelKind {
    pub const fn new() -> Self {
        Self {
            constraints: ConstraintCache::new(),
        }
    }
}

fn model_fragment() -> ConstraintSet {
    let mut set = ConstraintSet::default();
    let parent = vocab::tb_has_parent_model();
    set.create_exempt_out.insert(parent.as_str().to_string());
    set.card_out.push(Cardinality::at_most_one(parent.clone()));
    set.typed
        .push(TypedProperty::new(parent, NodeKind::Resource, None));
    set
}

impl ResourceKind for TraceModelKind {
    fn name(&self) -> &'static str {
        "TraceModel"
    }

    fn rdf_type(&self) -> NamedNode {
        vocab::tb_trace_model()
    }

    fn uri_prefix(&self) -> &'static str {
        "model"
    }

    fn constraints(&self) -> &ConstraintSet {
        self.constraints.get_or_init(|| {
            let core = super::core_fragment();
            let model = model_fragment();
            ConstraintSet::merged(&[&core, &model])
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::constraints::check_graph;
    use crate::kind::{ResourceKind, TRACE_MODEL};
    use crate::rdf::{vocab, Graph, NamedNode, Triple};

    fn n(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    #[test]
    fn test_model_with_own_type_passes_creation() {
        let uri = n("http://x/base1/model1");
        let mut g = Graph::new();
        g.insert(Triple::new(
            uri.clone(),
            vocab::rdf_type(),
            vocab::tb_trace_model(),
        ));

        let diag = check_graph(
            TRACE_MODEL.constraints(),
            &uri,
            &TRACE_MODEL.rdf_type(),
            &g,
            None,
        );
        assert!(diag.is_valid(), "{}", diag);
    }

    #[test]
    fn test_two_parent_models_rejected() {
        let uri = n("http://x/base1/model1");
        let mut g = Graph::new();
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_parent_model(),
            n("http://x/base1/m_a"),
        ));
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_parent_model(),
            n("http://x/base1/m_b"),
        ));

        let diag = check_graph(
            TRACE_MODEL.constraints(),
            &uri,
            &TRACE_MODEL.rdf_type(),
            &g,
            None,
        );
        assert!(!diag.is_valid());
        assert!(diag
            .problems()
            .iter()
            .any(|p| p.contains("cardinality") && p.contains("hasParentModel")));
    }
}
