//! RDF term definitions
//!
//! Thin wrappers around the oxrdf primitives, extended with the
//! predicates the mutation engine needs (fragment detection, prefix
//! tests, literal datatypes).

use oxrdf::{
    BlankNode as OxBlankNode, Literal as OxLiteral, NamedNode as OxNamedNode,
    Subject as OxSubject, Term as OxTerm, Triple as OxTriple,
};
use std::fmt;
use thiserror::Error;

/// RDF term errors
#[derive(Error, Debug)]
pub enum TermError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

pub type TermResult<T> = Result<T, TermError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: impl Into<String>) -> TermResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| TermError::InvalidIri(e.to_string()))
    }

    /// Create a named node from an IRI known to be valid
    pub fn new_unchecked(iri: impl Into<String>) -> Self {
        Self(OxNamedNode::new_unchecked(iri))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the IRI carries a fragment identifier
    pub fn has_fragment(&self) -> bool {
        self.as_str().contains('#')
    }

    /// Whether this IRI is a syntactic extension of `base`
    pub fn is_based_on(&self, base: &NamedNode) -> bool {
        self.as_str().starts_with(base.as_str())
    }

    /// Whether the IRI ends with the path separator (container form)
    pub fn is_container_form(&self) -> bool {
        self.as_str().ends_with('/')
    }

    /// Get the inner oxrdf node
    pub fn inner(&self) -> &OxNamedNode {
        &self.0
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        Self(node)
    }
}

impl From<NamedNode> for OxNamedNode {
    fn from(node: NamedNode) -> Self {
        node.0
    }
}

/// Blank node (anonymous node)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a new blank node with a unique identifier
    pub fn new() -> Self {
        Self(OxBlankNode::default())
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.as_str())
    }
}

impl From<OxBlankNode> for BlankNode {
    fn from(node: OxBlankNode) -> Self {
        Self(node)
    }
}

/// RDF literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a simple literal (plain string, xsd:string datatype)
    pub fn simple(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a typed literal
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self(OxLiteral::new_typed_literal(value, datatype.0))
    }

    /// Create an xsd:integer literal
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), super::vocab::xsd_integer())
    }

    /// Create a literal with a language tag
    pub fn language_tagged(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> TermResult<Self> {
        OxLiteral::new_language_tagged_literal(value, language)
            .map(Self)
            .map_err(|e| TermError::InvalidLiteral(e.to_string()))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype (xsd:string for untagged literals)
    pub fn datatype(&self) -> NamedNode {
        NamedNode(self.0.datatype().into_owned())
    }

    /// Parse the lexical value as an integer, if possible
    pub fn as_integer(&self) -> Option<i64> {
        self.value().parse().ok()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lang) = self.language() {
            write!(f, "\"{}\"@{}", self.value(), lang)
        } else {
            write!(f, "\"{}\"^^{}", self.value(), self.datatype())
        }
    }
}

impl From<OxLiteral> for Literal {
    fn from(lit: OxLiteral) -> Self {
        Self(lit)
    }
}

/// Triple subject (named or blank node)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// Named node (IRI)
    Named(NamedNode),
    /// Blank node
    Blank(BlankNode),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Named(n) => write!(f, "{}", n),
            Subject::Blank(b) => write!(f, "{}", b),
        }
    }
}

impl From<NamedNode> for Subject {
    fn from(node: NamedNode) -> Self {
        Subject::Named(node)
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Subject::Blank(node)
    }
}

impl From<OxSubject> for Subject {
    fn from(subject: OxSubject) -> Self {
        match subject {
            OxSubject::NamedNode(n) => Subject::Named(n.into()),
            OxSubject::BlankNode(b) => Subject::Blank(b.into()),
            #[allow(unreachable_patterns)]
            _ => panic!("RDF-star subjects not supported"),
        }
    }
}

impl From<Subject> for OxSubject {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Named(n) => OxSubject::NamedNode(n.0),
            Subject::Blank(b) => OxSubject::BlankNode(b.0),
        }
    }
}

/// Triple object (named node, blank node, or literal)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    /// Named node (IRI)
    Named(NamedNode),
    /// Blank node
    Blank(BlankNode),
    /// Literal value
    Literal(Literal),
}

impl Object {
    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Object::Literal(_))
    }

    /// The named node, if this object is one
    pub fn as_named(&self) -> Option<&NamedNode> {
        match self {
            Object::Named(n) => Some(n),
            _ => None,
        }
    }

    /// The literal, if this object is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Object::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Reinterpret as a subject, when not a literal
    pub fn to_subject(&self) -> Option<Subject> {
        match self {
            Object::Named(n) => Some(Subject::Named(n.clone())),
            Object::Blank(b) => Some(Subject::Blank(b.clone())),
            Object::Literal(_) => None,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Named(n) => write!(f, "{}", n),
            Object::Blank(b) => write!(f, "{}", b),
            Object::Literal(l) => write!(f, "{}", l),
        }
    }
}

impl From<NamedNode> for Object {
    fn from(node: NamedNode) -> Self {
        Object::Named(node)
    }
}

impl From<BlankNode> for Object {
    fn from(node: BlankNode) -> Self {
        Object::Blank(node)
    }
}

impl From<Literal> for Object {
    fn from(lit: Literal) -> Self {
        Object::Literal(lit)
    }
}

impl From<Subject> for Object {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Named(n) => Object::Named(n),
            Subject::Blank(b) => Object::Blank(b),
        }
    }
}

impl From<OxTerm> for Object {
    fn from(term: OxTerm) -> Self {
        match term {
            OxTerm::NamedNode(n) => Object::Named(n.into()),
            OxTerm::BlankNode(b) => Object::Blank(b.into()),
            OxTerm::Literal(l) => Object::Literal(l.into()),
            #[allow(unreachable_patterns)]
            _ => panic!("RDF-star terms not supported"),
        }
    }
}

impl From<Object> for OxTerm {
    fn from(object: Object) -> Self {
        match object {
            Object::Named(n) => OxTerm::NamedNode(n.0),
            Object::Blank(b) => OxTerm::BlankNode(b.0),
            Object::Literal(l) => OxTerm::Literal(l.0),
        }
    }
}

/// RDF triple (subject-predicate-object)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject
    pub subject: Subject,
    /// Predicate
    pub predicate: NamedNode,
    /// Object
    pub object: Object,
}

impl Triple {
    /// Create a new triple
    pub fn new(
        subject: impl Into<Subject>,
        predicate: NamedNode,
        object: impl Into<Object>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

impl From<OxTriple> for Triple {
    fn from(triple: OxTriple) -> Self {
        Self {
            subject: triple.subject.into(),
            predicate: triple.predicate.into(),
            object: triple.object.into(),
        }
    }
}

/// Triple pattern for queries (None = wildcard)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriplePattern {
    /// Subject (None = any)
    pub subject: Option<Subject>,
    /// Predicate (None = any)
    pub predicate: Option<NamedNode>,
    /// Object (None = any)
    pub object: Option<Object>,
}

impl TriplePattern {
    /// Pattern matching every triple
    pub fn any() -> Self {
        Self::default()
    }

    /// Pattern matching a single concrete triple
    pub fn exact(triple: &Triple) -> Self {
        Self {
            subject: Some(triple.subject.clone()),
            predicate: Some(triple.predicate.clone()),
            object: Some(triple.object.clone()),
        }
    }

    /// Fix the subject
    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Fix the predicate
    pub fn with_predicate(mut self, predicate: NamedNode) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Fix the object
    pub fn with_object(mut self, object: impl Into<Object>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Check if a triple matches this pattern
    pub fn matches(&self, triple: &Triple) -> bool {
        if let Some(ref s) = self.subject {
            if s != &triple.subject {
                return false;
            }
        }
        if let Some(ref p) = self.predicate {
            if p != &triple.predicate {
                return false;
            }
        }
        if let Some(ref o) = self.object {
            if o != &triple.object {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node() {
        let node = NamedNode::new("http://example.org/base1/").unwrap();
        assert_eq!(node.as_str(), "http://example.org/base1/");
        assert_eq!(node.to_string(), "<http://example.org/base1/>");
        assert!(node.is_container_form());
        assert!(!node.has_fragment());
    }

    #[test]
    fn test_fragment_and_prefix() {
        let base = NamedNode::new("http://example.org/base1/").unwrap();
        let child = NamedNode::new("http://example.org/base1/t1").unwrap();
        let frag = NamedNode::new("http://example.org/base1/t1#sub").unwrap();

        assert!(child.is_based_on(&base));
        assert!(frag.has_fragment());
        assert!(!child.has_fragment());
        assert!(!base.is_based_on(&child));
    }

    #[test]
    fn test_blank_node_uniqueness() {
        let b1 = BlankNode::new();
        let b2 = BlankNode::new();
        assert_ne!(b1, b2);
    }

    #[test]
    fn test_literal_datatype_defaults_to_string() {
        let lit = Literal::simple("hello");
        assert_eq!(
            lit.datatype().as_str(),
            "http://www.w3.org/2001/XMLSchema#string"
        );
    }

    #[test]
    fn test_integer_literal() {
        let lit = Literal::integer(42);
        assert_eq!(lit.as_integer(), Some(42));
        assert_eq!(
            lit.datatype().as_str(),
            "http://www.w3.org/2001/XMLSchema#integer"
        );
    }

    #[test]
    fn test_pattern_matching() {
        let s = NamedNode::new("http://example.org/a").unwrap();
        let p = NamedNode::new("http://example.org/p").unwrap();
        let t = Triple::new(s.clone(), p.clone(), Literal::simple("v"));

        assert!(TriplePattern::any().matches(&t));
        assert!(TriplePattern::any().with_subject(s).matches(&t));
        assert!(TriplePattern::exact(&t).matches(&t));

        let other = NamedNode::new("http://example.org/b").unwrap();
        assert!(!TriplePattern::any().with_subject(other).matches(&t));
    }

    #[test]
    fn test_object_to_subject() {
        let n = NamedNode::new("http://example.org/a").unwrap();
        let o = Object::Named(n.clone());
        assert_eq!(o.to_subject(), Some(Subject::Named(n)));
        assert_eq!(Object::Literal(Literal::simple("x")).to_subject(), None);
    }
}
