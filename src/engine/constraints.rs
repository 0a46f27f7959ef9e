//! Declarative structural constraints and their checker
//!
//! A [`ConstraintSet`] is attached to each resource kind: reserved
//! namespace prefixes with per-operation exemptions, cardinality
//! bounds, and typed-property rules. [`check_graph`] evaluates a set
//! against a proposed graph (creation) or a proposed graph plus the
//! precomputed added/removed deltas (edit), accumulating every
//! violation into one [`Diagnosis`]. It never errors for data reasons.

use super::Diagnosis;
use crate::rdf::{vocab, Graph, NamedNode, Object, Subject, Triple, TriplePattern};
use indexmap::IndexSet;

/// Expected node kind of a typed property's object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Named or blank node
    Resource,
    /// Literal value
    Literal,
}

/// Cardinality bound on a predicate, in one direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cardinality {
    /// Constrained predicate
    pub predicate: NamedNode,
    /// Minimum number of occurrences
    pub min: usize,
    /// Maximum number of occurrences (None = unbounded)
    pub max: Option<usize>,
}

impl Cardinality {
    /// Declare a cardinality bound
    pub fn new(predicate: NamedNode, min: usize, max: Option<usize>) -> Self {
        Self {
            predicate,
            min,
            max,
        }
    }

    /// Exactly-one shorthand
    pub fn exactly_one(predicate: NamedNode) -> Self {
        Self::new(predicate, 1, Some(1))
    }

    /// At-most-one shorthand
    pub fn at_most_one(predicate: NamedNode) -> Self {
        Self::new(predicate, 0, Some(1))
    }
}

/// Typed-property rule on an outgoing predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedProperty {
    /// Constrained predicate
    pub predicate: NamedNode,
    /// Required node kind of the object
    pub kind: NodeKind,
    /// For Resource: an rdf:type the object must carry in the graph.
    /// For Literal: the required datatype.
    pub expected: Option<NamedNode>,
}

impl TypedProperty {
    /// Declare a typed-property rule
    pub fn new(predicate: NamedNode, kind: NodeKind, expected: Option<NamedNode>) -> Self {
        Self {
            predicate,
            kind,
            expected,
        }
    }
}

/// Class-scoped structural rules for one resource kind.
///
/// Assembled once per kind by unioning the declared fragments of its
/// capability set; immutable after that.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    /// Namespace prefixes restricted to the system
    pub reserved_prefixes: Vec<String>,
    /// Outgoing predicates allowed at creation despite being reserved
    pub create_exempt_out: IndexSet<String>,
    /// Incoming predicates allowed at creation
    pub create_exempt_in: IndexSet<String>,
    /// rdf:type objects allowed at creation
    pub create_exempt_types: IndexSet<String>,
    /// Outgoing predicates additionally allowed when editing
    pub edit_exempt_out: IndexSet<String>,
    /// Incoming predicates additionally allowed when editing
    pub edit_exempt_in: IndexSet<String>,
    /// rdf:type objects additionally allowed when editing
    pub edit_exempt_types: IndexSet<String>,
    /// Cardinality bounds on outgoing edges
    pub card_out: Vec<Cardinality>,
    /// Cardinality bounds on incoming edges
    pub card_in: Vec<Cardinality>,
    /// Typed-property rules on outgoing edges
    pub typed: Vec<TypedProperty>,
}

impl ConstraintSet {
    /// Union of several constraint fragments.
    ///
    /// Exemption sets are unioned; cardinality and typed-property
    /// declarations are deduplicated by exact tuple equality, keeping
    /// first-seen order so checks run deterministically.
    pub fn merged(fragments: &[&ConstraintSet]) -> ConstraintSet {
        let mut out = ConstraintSet::default();
        for f in fragments {
            for p in &f.reserved_prefixes {
                if !out.reserved_prefixes.contains(p) {
                    out.reserved_prefixes.push(p.clone());
                }
            }
            out.create_exempt_out
                .extend(f.create_exempt_out.iter().cloned());
            out.create_exempt_in
                .extend(f.create_exempt_in.iter().cloned());
            out.create_exempt_types
                .extend(f.create_exempt_types.iter().cloned());
            out.edit_exempt_out.extend(f.edit_exempt_out.iter().cloned());
            out.edit_exempt_in.extend(f.edit_exempt_in.iter().cloned());
            out.edit_exempt_types
                .extend(f.edit_exempt_types.iter().cloned());
            for c in &f.card_out {
                if !out.card_out.contains(c) {
                    out.card_out.push(c.clone());
                }
            }
            for c in &f.card_in {
                if !out.card_in.contains(c) {
                    out.card_in.push(c.clone());
                }
            }
            for t in &f.typed {
                if !out.typed.contains(t) {
                    out.typed.push(t.clone());
                }
            }
        }
        out
    }

    fn is_reserved(&self, iri: &str) -> bool {
        self.reserved_prefixes.iter().any(|p| iri.starts_with(p))
    }
}

/// Check a proposed graph against a kind's constraints.
///
/// `delta` is None for creation (the whole graph is scanned) and
/// `Some((added, removed))` for an edit of an existing resource; the
/// deltas must have been computed once by the caller and are reused
/// here, never recomputed. Checks run namespace → cardinality →
/// typed-property so message ordering is stable.
pub fn check_graph(
    set: &ConstraintSet,
    uri: &NamedNode,
    main_type: &NamedNode,
    new_graph: &Graph,
    delta: Option<(&[Triple], &[Triple])>,
) -> Diagnosis {
    let mut diag = Diagnosis::new(format!("constraints on {}", uri.as_str()));
    let editing = delta.is_some();

    // 1. Reserved-namespace check over the relevant triples.
    let scan: Vec<Triple> = match delta {
        Some((added, removed)) => added.iter().chain(removed.iter()).cloned().collect(),
        None => new_graph.sorted(),
    };
    let rdf_type = vocab::rdf_type();
    let self_subject = Subject::Named(uri.clone());
    for t in &scan {
        let pred = t.predicate.as_str();
        let outgoing = t.subject == self_subject;
        let incoming = matches!(&t.object, Object::Named(n) if n == uri);

        if set.is_reserved(pred) {
            let exempt = if outgoing {
                set.create_exempt_out.contains(pred)
                    || (editing && set.edit_exempt_out.contains(pred))
            } else if incoming {
                set.create_exempt_in.contains(pred)
                    || (editing && set.edit_exempt_in.contains(pred))
            } else {
                // Reserved predicates on auxiliary nodes are never
                // exempt; exemptions are relative to the resource.
                false
            };
            if !exempt {
                diag.append(format!(
                    "predicate <{}> is reserved and not allowed here",
                    pred
                ));
            }
        }

        if t.predicate == rdf_type {
            if let Object::Named(ty) = &t.object {
                if set.is_reserved(ty.as_str()) {
                    // The kind's own main type is always exempt on the
                    // resource itself, at creation and (by inclusion)
                    // at edit. A reserved class asserted about any
                    // other node is checked the same as on the
                    // resource, minus the main-type allowance.
                    let exempt = (outgoing && ty == main_type)
                        || set.create_exempt_types.contains(ty.as_str())
                        || (editing && set.edit_exempt_types.contains(ty.as_str()));
                    if !exempt {
                        diag.append(format!("type <{}> is reserved", ty.as_str()));
                    }
                }
            }
        }
    }

    // 2. Cardinality check against the complete proposed graph.
    for c in &set.card_out {
        let count = new_graph.count_matching(
            &TriplePattern::any()
                .with_subject(uri.clone())
                .with_predicate(c.predicate.clone()),
        );
        report_cardinality(&mut diag, c, count, "outgoing");
    }
    for c in &set.card_in {
        let count = new_graph.count_matching(
            &TriplePattern::any()
                .with_predicate(c.predicate.clone())
                .with_object(uri.clone()),
        );
        report_cardinality(&mut diag, c, count, "incoming");
    }

    // 3. Typed-property check on the resource's outgoing edges.
    for rule in &set.typed {
        let mut objects = new_graph.objects_for(&self_subject, &rule.predicate);
        objects.sort_by_key(|o| o.to_string());
        for object in objects {
            check_typed(&mut diag, rule, &object, new_graph);
        }
    }

    diag
}

fn report_cardinality(diag: &mut Diagnosis, c: &Cardinality, count: usize, direction: &str) {
    if count < c.min {
        diag.append(format!(
            "cardinality of {} <{}>: expected at least {}, got {}",
            direction,
            c.predicate.as_str(),
            c.min,
            count
        ));
    } else if let Some(max) = c.max {
        if count > max {
            diag.append(format!(
                "cardinality of {} <{}>: expected at most {}, got {}",
                direction,
                c.predicate.as_str(),
                max,
                count
            ));
        }
    }
}

fn check_typed(diag: &mut Diagnosis, rule: &TypedProperty, object: &Object, graph: &Graph) {
    match rule.kind {
        NodeKind::Resource => match object {
            Object::Literal(_) => diag.append(format!(
                "value of <{}> must be a resource, got a literal",
                rule.predicate.as_str()
            )),
            _ => {
                if let (Some(expected), Some(subject)) = (&rule.expected, object.to_subject()) {
                    let types = graph.types_of(&subject);
                    if !types.contains(expected) {
                        diag.append(format!(
                            "value of <{}> must have type <{}>",
                            rule.predicate.as_str(),
                            expected.as_str()
                        ));
                    }
                }
            }
        },
        NodeKind::Literal => match object {
            Object::Literal(lit) => {
                if let Some(expected) = &rule.expected {
                    let datatype = lit.datatype();
                    if &datatype != expected {
                        diag.append(format!(
                            "value of <{}> must have datatype <{}>, got <{}>",
                            rule.predicate.as_str(),
                            expected.as_str(),
                            datatype.as_str()
                        ));
                    }
                }
            }
            _ => diag.append(format!(
                "value of <{}> must be a literal",
                rule.predicate.as_str()
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;

    const NS: &str = "https://w3id.org/tracebase#";

    fn n(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn tb(local: &str) -> NamedNode {
        n(&format!("{}{}", NS, local))
    }

    fn base_set() -> ConstraintSet {
        let mut set = ConstraintSet::default();
        set.reserved_prefixes.push(NS.to_string());
        set
    }

    fn uri() -> NamedNode {
        n("http://x/base1/t1")
    }

    #[test]
    fn test_clean_graph_passes() {
        let set = base_set();
        let mut g = Graph::new();
        g.insert(Triple::new(
            uri(),
            n("http://other/p"),
            Literal::simple("v"),
        ));
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(d.is_valid(), "{}", d);
    }

    #[test]
    fn test_main_type_is_creation_exempt() {
        let set = base_set();
        let mut g = Graph::new();
        g.insert(Triple::new(uri(), vocab::rdf_type(), tb("StoredTrace")));
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(d.is_valid(), "{}", d);
    }

    #[test]
    fn test_other_reserved_type_rejected_at_creation() {
        let set = base_set();
        let mut g = Graph::new();
        g.insert(Triple::new(uri(), vocab::rdf_type(), tb("Base")));
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(!d.is_valid());
        assert!(d.problems().iter().any(|p| p.contains("reserved")));
    }

    #[test]
    fn test_reserved_predicate_needs_exemption() {
        let mut set = base_set();
        let mut g = Graph::new();
        g.insert(Triple::new(uri(), tb("hasOrigin"), Literal::simple("o")));

        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(!d.is_valid());

        set.create_exempt_out
            .insert(tb("hasOrigin").as_str().to_string());
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(d.is_valid(), "{}", d);
    }

    #[test]
    fn test_edit_exemption_extends_creation_exemption() {
        let mut set = base_set();
        set.edit_exempt_out
            .insert(tb("hasObselCount").as_str().to_string());

        let mut g = Graph::new();
        let t = Triple::new(uri(), tb("hasObselCount"), Literal::integer(3));
        g.insert(t.clone());

        // Rejected at creation, accepted as an edit-time addition.
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(!d.is_valid());

        let added = vec![t];
        let removed: Vec<Triple> = Vec::new();
        let d = check_graph(
            &set,
            &uri(),
            &tb("StoredTrace"),
            &g,
            Some((added.as_slice(), removed.as_slice())),
        );
        assert!(d.is_valid(), "{}", d);
    }

    #[test]
    fn test_reserved_predicate_on_auxiliary_node_rejected() {
        let mut set = base_set();
        set.create_exempt_out
            .insert(tb("hasOrigin").as_str().to_string());
        let mut g = Graph::new();
        g.insert(Triple::new(
            n("http://x/other"),
            tb("hasOrigin"),
            Literal::simple("o"),
        ));
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(!d.is_valid());
    }

    #[test]
    fn test_reserved_type_on_auxiliary_node_rejected() {
        let set = base_set();
        let mut g = Graph::new();
        g.insert(Triple::new(
            n("http://x/base1/aux"),
            vocab::rdf_type(),
            tb("Base"),
        ));
        let d = check_graph(&set, &uri(), &tb("TraceModel"), &g, None);
        assert!(!d.is_valid());
        assert!(d.problems()[0].contains("reserved"));

        // The main-type allowance never transfers to other nodes.
        let mut g = Graph::new();
        g.insert(Triple::new(
            n("http://x/base1/aux"),
            vocab::rdf_type(),
            tb("TraceModel"),
        ));
        let d = check_graph(&set, &uri(), &tb("TraceModel"), &g, None);
        assert!(!d.is_valid());
    }

    #[test]
    fn test_cardinality_sweep() {
        let mut set = base_set();
        let p = n("http://other/p");
        set.card_out.push(Cardinality::new(p.clone(), 1, Some(2)));

        for (count, ok) in [(0, false), (1, true), (2, true), (3, false)] {
            let mut g = Graph::new();
            for i in 0..count {
                g.insert(Triple::new(
                    uri(),
                    p.clone(),
                    Literal::simple(format!("v{}", i)),
                ));
            }
            let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
            assert_eq!(d.is_valid(), ok, "count={}: {}", count, d);
            if !ok {
                assert!(d.problems()[0].contains("cardinality"));
            }
        }
    }

    #[test]
    fn test_incoming_cardinality() {
        let mut set = base_set();
        let p = n("http://other/memberOf");
        set.card_in.push(Cardinality::at_most_one(p.clone()));

        let mut g = Graph::new();
        g.insert(Triple::new(n("http://x/a"), p.clone(), uri()));
        g.insert(Triple::new(n("http://x/b"), p.clone(), uri()));
        let d = check_graph(&set, &uri(), &tb("StoredTrace"), &g, None);
        assert!(!d.is_valid());
        assert!(d.problems()[0].contains("incoming"));
    }

    #[test]
    fn test_typed_property_literal_datatype() {
        let mut set = base_set();
        let p = n("http://other/begin");
        set.typed.push(TypedProperty::new(
            p.clone(),
            NodeKind::Literal,
            Some(vocab::xsd_integer()),
        ));

        let mut g = Graph::new();
        g.insert(Triple::new(uri(), p.clone(), Literal::integer(5)));
        assert!(check_graph(&set, &uri(), &tb("T"), &g, None).is_valid());

        let mut g = Graph::new();
        g.insert(Triple::new(uri(), p.clone(), Literal::simple("five")));
        let d = check_graph(&set, &uri(), &tb("T"), &g, None);
        assert!(!d.is_valid());
        assert!(d.problems()[0].contains("datatype"));
    }

    #[test]
    fn test_typed_property_resource_with_expected_type() {
        let mut set = base_set();
        let p = n("http://other/model");
        let expected = n("http://other/Model");
        set.typed.push(TypedProperty::new(
            p.clone(),
            NodeKind::Resource,
            Some(expected.clone()),
        ));

        let target = n("http://x/m1");
        let mut g = Graph::new();
        g.insert(Triple::new(uri(), p.clone(), target.clone()));

        // Object lacks the expected type.
        let d = check_graph(&set, &uri(), &tb("T"), &g, None);
        assert!(!d.is_valid());

        g.insert(Triple::new(target, vocab::rdf_type(), expected));
        let d = check_graph(&set, &uri(), &tb("T"), &g, None);
        assert!(d.is_valid(), "{}", d);
    }

    #[test]
    fn test_typed_property_resource_rejects_literal() {
        let mut set = base_set();
        let p = n("http://other/model");
        set.typed
            .push(TypedProperty::new(p.clone(), NodeKind::Resource, None));

        let mut g = Graph::new();
        g.insert(Triple::new(uri(), p, Literal::simple("not a node")));
        let d = check_graph(&set, &uri(), &tb("T"), &g, None);
        assert!(!d.is_valid());
        assert!(d.problems()[0].contains("must be a resource"));
    }

    #[test]
    fn test_all_violations_reported_in_fixed_order() {
        let mut set = base_set();
        let p = n("http://other/p");
        set.card_out.push(Cardinality::new(p.clone(), 1, None));
        set.typed.push(TypedProperty::new(
            n("http://other/q"),
            NodeKind::Literal,
            None,
        ));

        let mut g = Graph::new();
        g.insert(Triple::new(uri(), tb("secret"), Literal::simple("x")));
        g.insert(Triple::new(uri(), n("http://other/q"), n("http://x/n")));

        let d = check_graph(&set, &uri(), &tb("T"), &g, None);
        assert_eq!(d.problems().len(), 3);
        // namespace, then cardinality, then typed-property
        assert!(d.problems()[0].contains("reserved"));
        assert!(d.problems()[1].contains("cardinality"));
        assert!(d.problems()[2].contains("literal"));
    }

    #[test]
    fn test_merged_dedupes_and_unions() {
        let mut a = base_set();
        a.card_out
            .push(Cardinality::exactly_one(n("http://other/p")));
        a.create_exempt_out.insert("http://other/x".to_string());

        let mut b = base_set();
        b.card_out
            .push(Cardinality::exactly_one(n("http://other/p")));
        b.card_out
            .push(Cardinality::at_most_one(n("http://other/q")));
        b.create_exempt_out.insert("http://other/y".to_string());

        let m = ConstraintSet::merged(&[&a, &b]);
        assert_eq!(m.reserved_prefixes.len(), 1);
        assert_eq!(m.card_out.len(), 2);
        assert_eq!(m.create_exempt_out.len(), 2);
    }
}
