//! Stored-trace resource kind
//!
//! A leaf holding obsels collected from outside. Must reference
//! exactly one model and one origin; its temporal extension, when
//! declared, must be a well-ordered integer interval.

use super::{ConstraintCache, ResourceKind};
use crate::engine::{Cardinality, ConstraintSet, Diagnosis, NodeKind, TypedProperty};
use crate::rdf::{vocab, Graph, Literal, NamedNode, Subject, Triple};

/// The stored-trace kind
pub struct StoredTraceKind {
    constraints: ConstraintCache,
}

impl StoredTraceKind {
    pub const fn new() -> Self {
        Self {
            constraints: ConstraintCache::new(),
        }
    }
}

fn trace_fragment() -> ConstraintSet {
    let mut set = ConstraintSet::default();
    let model = vocab::tb_has_model();
    let origin = vocab::tb_has_origin();
    let begin = vocab::tb_has_trace_begin();
    let end = vocab::tb_has_trace_end();
    let count = vocab::tb_has_obsel_count();

    for p in [&model, &origin, &begin, &end, &count] {
        set.create_exempt_out.insert(p.as_str().to_string());
    }

    set.card_out.push(Cardinality::exactly_one(model.clone()));
    set.card_out.push(Cardinality::exactly_one(origin.clone()));
    set.card_out.push(Cardinality::at_most_one(begin.clone()));
    set.card_out.push(Cardinality::at_most_one(end.clone()));
    set.card_out.push(Cardinality::at_most_one(count.clone()));

    set.typed
        .push(TypedProperty::new(model, NodeKind::Resource, None));
    set.typed.push(TypedProperty::new(
        begin,
        NodeKind::Literal,
        Some(vocab::xsd_integer()),
    ));
    set.typed.push(TypedProperty::new(
        end,
        NodeKind::Literal,
        Some(vocab::xsd_integer()),
    ));
    set.typed.push(TypedProperty::new(
        count,
        NodeKind::Literal,
        Some(vocab::xsd_integer()),
    ));
    set
}

fn integer_of(graph: &Graph, uri: &NamedNode, predicate: &NamedNode) -> Option<i64> {
    graph
        .objects_for(&Subject::Named(uri.clone()), predicate)
        .into_iter()
        .find_map(|o| o.as_literal().and_then(Literal::as_integer))
}

impl ResourceKind for StoredTraceKind {
    fn name(&self) -> &'static str {
        "StoredTrace"
    }

    fn rdf_type(&self) -> NamedNode {
        vocab::tb_stored_trace()
    }

    fn uri_prefix(&self) -> &'static str {
        "trace"
    }

    fn constraints(&self) -> &ConstraintSet {
        self.constraints.get_or_init(|| {
            let core = super::core_fragment();
            let trace = trace_fragment();
            ConstraintSet::merged(&[&core, &trace])
        })
    }

    fn complete_new_graph(&self, uri: &NamedNode, graph: &mut Graph) {
        let count = vocab::tb_has_obsel_count();
        let subject = Subject::Named(uri.clone());
        if graph.objects_for(&subject, &count).is_empty() {
            graph.insert(Triple::new(uri.clone(), count, Literal::integer(0)));
        }
    }

    fn check_extra(&self, uri: &NamedNode, graph: &Graph) -> Diagnosis {
        let mut diag = Diagnosis::new(self.name());
        let begin = integer_of(graph, uri, &vocab::tb_has_trace_begin());
        let end = integer_of(graph, uri, &vocab::tb_has_trace_end());
        if let (Some(begin), Some(end)) = (begin, end) {
            if begin > end {
                diag.append(format!("traceBegin > traceEnd ({} > {})", begin, end));
            }
        }
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constraints::check_graph;
    use crate::kind::STORED_TRACE;

    fn n(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn trace_uri() -> NamedNode {
        n("http://x/base1/t1")
    }

    fn minimal_trace() -> Graph {
        let uri = trace_uri();
        let mut g = Graph::new();
        g.insert(Triple::new(
            uri.clone(),
            vocab::rdf_type(),
            vocab::tb_stored_trace(),
        ));
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_model(),
            n("http://x/base1/model1"),
        ));
        g.insert(Triple::new(
            uri,
            vocab::tb_has_origin(),
            Literal::simple("1970-01-01T00:00:00Z"),
        ));
        g
    }

    #[test]
    fn test_minimal_trace_passes_after_completion() {
        let uri = trace_uri();
        let mut g = minimal_trace();
        STORED_TRACE.complete_new_graph(&uri, &mut g);

        let diag = check_graph(
            STORED_TRACE.constraints(),
            &uri,
            &STORED_TRACE.rdf_type(),
            &g,
            None,
        );
        assert!(diag.is_valid(), "{}", diag);
    }

    #[test]
    fn test_complete_new_graph_fills_obsel_count_once() {
        let uri = trace_uri();
        let mut g = minimal_trace();
        STORED_TRACE.complete_new_graph(&uri, &mut g);
        let len = g.len();
        STORED_TRACE.complete_new_graph(&uri, &mut g);
        assert_eq!(g.len(), len);
    }

    #[test]
    fn test_missing_model_rejected() {
        let uri = trace_uri();
        let mut g = minimal_trace();
        let model_edges = g.matching(
            &crate::rdf::TriplePattern::any().with_predicate(vocab::tb_has_model()),
        );
        for t in model_edges {
            g.remove(&t);
        }
        STORED_TRACE.complete_new_graph(&uri, &mut g);

        let diag = check_graph(
            STORED_TRACE.constraints(),
            &uri,
            &STORED_TRACE.rdf_type(),
            &g,
            None,
        );
        assert!(!diag.is_valid());
        assert!(diag
            .problems()
            .iter()
            .any(|p| p.contains("hasModel") && p.contains("at least 1")));
    }

    #[test]
    fn test_begin_after_end_rejected() {
        let uri = trace_uri();
        let mut g = minimal_trace();
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_trace_begin(),
            Literal::integer(1000),
        ));
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_trace_end(),
            Literal::integer(500),
        ));

        let diag = STORED_TRACE.check_extra(&uri, &g);
        assert!(!diag.is_valid());
        assert!(diag.problems()[0].contains("traceBegin > traceEnd"));
    }

    #[test]
    fn test_ordered_interval_accepted() {
        let uri = trace_uri();
        let mut g = minimal_trace();
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_trace_begin(),
            Literal::integer(100),
        ));
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_trace_end(),
            Literal::integer(100),
        ));
        assert!(STORED_TRACE.check_extra(&uri, &g).is_valid());
    }

    #[test]
    fn test_non_integer_begin_rejected_by_typed_rule() {
        let uri = trace_uri();
        let mut g = minimal_trace();
        g.insert(Triple::new(
            uri.clone(),
            vocab::tb_has_trace_begin(),
            Literal::simple("early"),
        ));
        STORED_TRACE.complete_new_graph(&uri, &mut g);

        let diag = check_graph(
            STORED_TRACE.constraints(),
            &uri,
            &STORED_TRACE.rdf_type(),
            &g,
            None,
        );
        assert!(!diag.is_valid());
        assert!(diag.problems().iter().any(|p| p.contains("datatype")));
    }
}
