//! Resource identity: URI minting and created-node location
//!
//! Minting appends a short random token to a kind-derived prefix under
//! the container URI, growing the token on collision so termination is
//! guaranteed and expected retries stay O(1) for sparse namespaces.

use super::creation::CreatedNode;
use super::{EngineError, EngineResult};
use crate::rdf::{Graph, NamedNode, Object, Subject};
use oxiri::Iri;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Syntax accepted for caller-supplied id labels: a single path
/// segment, optionally ending with the container separator.
fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/?$").expect("valid id regex"))
}

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_lowercase())
        .collect()
}

/// Mint a fresh URI for a new child of `container`.
///
/// The result is `<container><prefix>-<token>`, with a trailing `/`
/// when the new resource is itself container-like. The token starts at
/// 2 random characters and grows by 1 on each collision with a node
/// already mentioned in the container's graph.
pub fn mint_uri(
    container: &NamedNode,
    graph: &Graph,
    prefix: &str,
    container_like: bool,
) -> EngineResult<NamedNode> {
    let separator = if container_like { "/" } else { "" };
    let mut token_len = 2;
    loop {
        let candidate = format!(
            "{}{}-{}{}",
            container.as_str(),
            prefix,
            random_token(token_len),
            separator
        );
        if !graph.mentions_iri(&candidate) {
            return Ok(NamedNode::new(candidate)?);
        }
        token_len += 1;
    }
}

/// Resolve a caller-supplied id label against the container URI.
///
/// The label must be a plain path segment; the result must not be in
/// use anywhere in the container's graph.
pub fn resolve_id(
    container: &NamedNode,
    id: &str,
    container_like: bool,
    graph: &Graph,
) -> EngineResult<NamedNode> {
    if !id_regex().is_match(id) {
        return Err(EngineError::Invalid({
            let mut d = super::Diagnosis::new("id");
            d.append(format!("invalid id label: {:?}", id));
            d
        }));
    }
    let base = Iri::parse(container.as_str().to_string())
        .map_err(|e| crate::rdf::TermError::InvalidIri(e.to_string()))?;
    let resolved = base
        .resolve(id)
        .map_err(|e| crate::rdf::TermError::InvalidIri(e.to_string()))?;
    let mut uri = resolved.as_str().to_string();
    if container_like && !uri.ends_with('/') {
        uri.push('/');
    }
    let uri = NamedNode::new(uri)?;
    if !uri.is_based_on(container) || uri.as_str() == container.as_str() {
        return Err(EngineError::IdentityConflict(uri.as_str().to_string()));
    }
    if graph.mentions(&uri) {
        return Err(EngineError::IdentityConflict(uri.as_str().to_string()));
    }
    Ok(uri)
}

/// Locate the node meant to become the new resource in a posted graph.
///
/// Candidates are the non-literal nodes directly linked to or from the
/// container. A single candidate is accepted unless it is a URI with a
/// fragment. With several candidates there must be exactly one URI
/// without a fragment (the base) and every other candidate must be a
/// URI based on it; the base is then the created node. Anything else
/// is "not found" — a sentinel, not an error, that callers translate
/// into a malformed-submission failure.
pub fn find_created(container: &NamedNode, posted: &Graph) -> Option<CreatedNode> {
    let container_subject = Subject::Named(container.clone());
    let mut named: BTreeSet<String> = BTreeSet::new();
    let mut blanks: Vec<crate::rdf::BlankNode> = Vec::new();

    let mut push = |subject: Option<&Subject>, object: Option<&Object>| {
        match (subject, object) {
            (Some(Subject::Named(n)), _) | (_, Some(Object::Named(n))) => {
                named.insert(n.as_str().to_string());
            }
            (Some(Subject::Blank(b)), _) | (_, Some(Object::Blank(b))) => {
                if !blanks.iter().any(|x| x == b) {
                    blanks.push(b.clone());
                }
            }
            _ => {}
        };
    };

    for t in posted.iter() {
        if t.subject == container_subject {
            if !t.object.is_literal() {
                push(None, Some(&t.object));
            }
        } else if matches!(&t.object, Object::Named(n) if n == container) {
            push(Some(&t.subject), None);
        }
    }

    // Candidates linked both ways count once; the container itself is
    // never a candidate.
    named.remove(container.as_str());

    let total = named.len() + blanks.len();
    match total {
        0 => None,
        1 => {
            if let Some(b) = blanks.pop() {
                Some(CreatedNode::Blank(b))
            } else {
                let n = NamedNode::new(named.into_iter().next()?).ok()?;
                if n.has_fragment() {
                    None
                } else {
                    Some(CreatedNode::Named(n))
                }
            }
        }
        _ => {
            if !blanks.is_empty() {
                return None;
            }
            let bases: Vec<&String> = named.iter().filter(|n| !n.contains('#')).collect();
            if bases.len() != 1 {
                return None;
            }
            let base = bases[0].clone();
            if named.iter().all(|n| n.starts_with(&base)) {
                Some(CreatedNode::Named(NamedNode::new(base).ok()?))
            } else {
                None
            }
        }
    }
}
