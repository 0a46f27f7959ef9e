//! Vocabulary constants
//!
//! The reserved namespace of the trace-base vocabulary, the metadata
//! bookkeeping terms, and the RDF/XSD terms the engine relies on.

use super::term::NamedNode;
use oxrdf::vocab::{rdf, xsd};

/// Reserved namespace prefix of the trace-base vocabulary.
pub const TB_NS: &str = "https://w3id.org/tracebase#";

/// Suffix appended to a resource URI to name its metadata graph.
pub const METADATA_SUFFIX: &str = "#metadata";

fn tb(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{}{}", TB_NS, local))
}

// Classes

pub fn tb_root() -> NamedNode {
    tb("Root")
}

pub fn tb_base() -> NamedNode {
    tb("Base")
}

pub fn tb_trace_model() -> NamedNode {
    tb("TraceModel")
}

pub fn tb_stored_trace() -> NamedNode {
    tb("StoredTrace")
}

// Predicates

pub fn tb_contains() -> NamedNode {
    tb("contains")
}

pub fn tb_has_model() -> NamedNode {
    tb("hasModel")
}

pub fn tb_has_origin() -> NamedNode {
    tb("hasOrigin")
}

pub fn tb_has_trace_begin() -> NamedNode {
    tb("hasTraceBegin")
}

pub fn tb_has_trace_end() -> NamedNode {
    tb("hasTraceEnd")
}

pub fn tb_has_obsel_count() -> NamedNode {
    tb("hasObselCount")
}

pub fn tb_has_parent_model() -> NamedNode {
    tb("hasParentModel")
}

// Metadata bookkeeping (never exposed through get_state)

pub fn tb_has_implementation() -> NamedNode {
    tb("hasImplementation")
}

pub fn tb_has_etag() -> NamedNode {
    tb("hasEtag")
}

pub fn tb_last_modified() -> NamedNode {
    tb("lastModified")
}

// RDF / XSD

pub fn rdf_type() -> NamedNode {
    rdf::TYPE.into_owned().into()
}

pub fn xsd_integer() -> NamedNode {
    xsd::INTEGER.into_owned().into()
}

pub fn xsd_date_time() -> NamedNode {
    xsd::DATE_TIME.into_owned().into()
}

/// Graph id of the metadata graph attached to a resource URI.
pub fn metadata_graph_id(uri: &str) -> String {
    format!("{}{}", uri, METADATA_SUFFIX)
}
