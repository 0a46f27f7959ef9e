//! Owned triple-set graph
//!
//! The unit of resource state: every resource owns exactly one public
//! graph and one metadata graph. Supports pattern queries, a one-pass
//! symmetric diff, and whole-graph blank-node rewriting.

use super::term::{BlankNode, NamedNode, Object, Subject, Triple, TriplePattern};
use rustc_hash::FxHashSet;

/// A set of triples belonging to a single resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    triples: FxHashSet<Triple>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple; returns false if it was already present
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Remove a triple; returns false if it was absent
    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    /// Check if a triple is present
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Number of triples
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Whether the graph holds no triples
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate over all triples
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// All triples matching a pattern
    pub fn matching(&self, pattern: &TriplePattern) -> Vec<Triple> {
        self.triples
            .iter()
            .filter(|t| pattern.matches(t))
            .cloned()
            .collect()
    }

    /// Count of triples matching a pattern
    pub fn count_matching(&self, pattern: &TriplePattern) -> usize {
        self.triples.iter().filter(|t| pattern.matches(t)).count()
    }

    /// Objects of all triples with the given subject and predicate
    pub fn objects_for(&self, subject: &Subject, predicate: &NamedNode) -> Vec<Object> {
        self.triples
            .iter()
            .filter(|t| &t.subject == subject && &t.predicate == predicate)
            .map(|t| t.object.clone())
            .collect()
    }

    /// Subjects of all triples with the given predicate and object
    pub fn subjects_for(&self, predicate: &NamedNode, object: &Object) -> Vec<Subject> {
        self.triples
            .iter()
            .filter(|t| &t.predicate == predicate && &t.object == object)
            .map(|t| t.subject.clone())
            .collect()
    }

    /// rdf:type objects of a node that are named nodes, sorted
    pub fn types_of(&self, subject: &Subject) -> Vec<NamedNode> {
        let rdf_type = super::vocab::rdf_type();
        let mut types: Vec<NamedNode> = self
            .objects_for(subject, &rdf_type)
            .into_iter()
            .filter_map(|o| o.as_named().cloned())
            .collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types.dedup();
        types
    }

    /// Whether a named node occurs anywhere, as subject or object
    pub fn mentions(&self, node: &NamedNode) -> bool {
        self.triples.iter().any(|t| {
            matches!(&t.subject, Subject::Named(n) if n == node)
                || matches!(&t.object, Object::Named(n) if n == node)
        })
    }

    /// Whether any triple uses an IRI string as subject or object
    pub fn mentions_iri(&self, iri: &str) -> bool {
        self.triples.iter().any(|t| {
            matches!(&t.subject, Subject::Named(n) if n.as_str() == iri)
                || matches!(&t.object, Object::Named(n) if n.as_str() == iri)
        })
    }

    /// Symmetric difference against a proposed newer state.
    ///
    /// Returns `(added, removed)`: triples present only in `newer`,
    /// and triples present only in `self`. Both are sorted by their
    /// N-Triples form so downstream messages are deterministic. This
    /// is the single diff pass reused by every constraint check.
    pub fn diff(&self, newer: &Graph) -> (Vec<Triple>, Vec<Triple>) {
        let mut added: Vec<Triple> = newer
            .triples
            .difference(&self.triples)
            .cloned()
            .collect();
        let mut removed: Vec<Triple> = self
            .triples
            .difference(&newer.triples)
            .cloned()
            .collect();
        added.sort_by_key(|t| t.to_string());
        removed.sort_by_key(|t| t.to_string());
        (added, removed)
    }

    /// Replace every occurrence of a blank node with a named node.
    ///
    /// One pass over the whole graph, run before any constraint check
    /// so checks never see blank-node placeholders for a minted URI.
    pub fn rewrite_blank(&mut self, blank: &BlankNode, uri: &NamedNode) {
        let affected: Vec<Triple> = self
            .triples
            .iter()
            .filter(|t| {
                matches!(&t.subject, Subject::Blank(b) if b == blank)
                    || matches!(&t.object, Object::Blank(b) if b == blank)
            })
            .cloned()
            .collect();
        for old in affected {
            self.triples.remove(&old);
            let subject = match &old.subject {
                Subject::Blank(b) if b == blank => Subject::Named(uri.clone()),
                other => other.clone(),
            };
            let object = match &old.object {
                Object::Blank(b) if b == blank => Object::Named(uri.clone()),
                other => other.clone(),
            };
            self.triples.insert(Triple {
                subject,
                predicate: old.predicate,
                object,
            });
        }
    }

    /// All triples, sorted by their N-Triples form
    pub fn sorted(&self) -> Vec<Triple> {
        let mut all: Vec<Triple> = self.triples.iter().cloned().collect();
        all.sort_by_key(|t| t.to_string());
        all
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}
