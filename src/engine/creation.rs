//! Creation-protocol helpers
//!
//! The pieces of the POST-like pipeline that are independent of the
//! façade: call-parameter recognition, election of the child's
//! implementation kind from its declared rdf:type(s), and the
//! container-side suitability check on the created node.

use super::{EngineError, EngineResult, Parameters};
use crate::kind::ResourceKind;
use crate::rdf::{BlankNode, Graph, NamedNode, Subject};

/// The node of a posted graph that becomes the new resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedNode {
    /// Concrete URI supplied by the caller
    Named(NamedNode),
    /// Blank node; a URI will be minted for it
    Blank(BlankNode),
}

impl CreatedNode {
    /// View as a triple subject
    pub fn as_subject(&self) -> Subject {
        match self {
            CreatedNode::Named(n) => Subject::Named(n.clone()),
            CreatedNode::Blank(b) => Subject::Blank(b.clone()),
        }
    }
}

/// Reject any parameter outside the recognized option set.
pub fn check_parameters(
    parameters: Option<&Parameters>,
    recognized: &[&str],
) -> EngineResult<()> {
    if let Some(parameters) = parameters {
        for key in parameters.keys() {
            if !recognized.contains(&key.as_str()) {
                return Err(EngineError::UnrecognizedParameter(key.clone()));
            }
        }
    }
    Ok(())
}

/// Determine the child's implementation kind from its rdf:type(s).
///
/// Exactly one declared type must match the container's recognized
/// child-kind map; zero or several matches are client-visible errors.
/// A `type_hint` (trusted fast path) short-circuits the election but
/// must still name a recognized child kind.
pub fn elect_child_kind(
    container: &dyn ResourceKind,
    created: &CreatedNode,
    posted: &Graph,
    type_hint: Option<&NamedNode>,
) -> EngineResult<&'static dyn ResourceKind> {
    let child_kinds = container.child_kinds();

    if let Some(hint) = type_hint {
        return child_kinds
            .iter()
            .find(|k| &k.rdf_type() == hint)
            .copied()
            .ok_or_else(|| EngineError::NoRecognizedType(hint.as_str().to_string()));
    }

    let declared = posted.types_of(&created.as_subject());
    let matched: Vec<&'static dyn ResourceKind> = child_kinds
        .iter()
        .filter(|k| declared.contains(&k.rdf_type()))
        .copied()
        .collect();

    match matched.len() {
        0 => Err(EngineError::NoRecognizedType(format!(
            "declared types: [{}]",
            declared
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
        1 => Ok(matched[0]),
        _ => Err(EngineError::AmbiguousType(
            matched
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

/// Check the created node's suitability as a child of this container.
///
/// Orthogonal to the child's own structural constraints: a concrete
/// URI must be a syntactic child of the container and must not already
/// be in use in the container's graph.
pub fn check_suitable(
    container: &NamedNode,
    container_graph: &Graph,
    created: &CreatedNode,
) -> EngineResult<()> {
    if let CreatedNode::Named(uri) = created {
        if !uri.is_based_on(container) || uri.as_str() == container.as_str() {
            return Err(EngineError::IdentityConflict(format!(
                "<{}> is not inside container <{}>",
                uri.as_str(),
                container.as_str()
            )));
        }
        if container_graph.mentions(uri) {
            return Err(EngineError::IdentityConflict(uri.as_str().to_string()));
        }
    }
    Ok(())
}
