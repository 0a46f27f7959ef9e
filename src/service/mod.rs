//! Repository façade
//!
//! The surface exposed to an outer protocol layer: read a resource's
//! state, run an untrusted or trusted edit, create a child in a
//! container, delete a resource. Every mutation runs the full pipeline
//! (lock, edit session, constraint check, minimal delta, metadata
//! stamping, commit) and leaves the store untouched on any failure.

use crate::config::ServiceConfig;
use crate::engine::{
    constraints, creation, identity, CreatedNode, EditTracker, EngineError, EngineResult,
    LockManager, Parameters,
};
use crate::kind::{self, ResourceKind};
use crate::rdf::{vocab, Graph, Literal, NamedNode, Object, Subject, Triple, TriplePattern};
use crate::store::{MemoryStore, TripleStore};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A repository of trace resources over an in-memory store.
///
/// Owns the store, the per-URI registry of live resources, the edit
/// session tracker and the lock manager. Deleted resources leave a
/// tombstone so stale handles fail with [`EngineError::Deleted`]
/// rather than silently reappearing.
pub struct Repository {
    config: ServiceConfig,
    root: NamedNode,
    store: MemoryStore,
    registry: HashMap<String, &'static dyn ResourceKind>,
    tombstones: HashSet<String>,
    edits: EditTracker,
    locks: LockManager,
}

impl Repository {
    /// Bootstrap a repository: the root resource is created through
    /// the trusted path and committed before the call returns.
    pub fn new(config: ServiceConfig) -> EngineResult<Self> {
        let root = NamedNode::new(config.root_uri.clone())?;
        let locks = LockManager::new(&config.lock_dir)?;
        let mut repo = Self {
            config,
            root: root.clone(),
            store: MemoryStore::new(),
            registry: HashMap::new(),
            tombstones: HashSet::new(),
            edits: EditTracker::new(),
            locks,
        };

        repo.registry
            .insert(root.as_str().to_string(), &kind::ROOT);
        let root_id = root.as_str().to_string();
        let root_type = Triple::new(root.clone(), vocab::rdf_type(), kind::ROOT.rdf_type());
        repo.with_trusted_edit(root.as_str(), None, move |r| {
            r.store.insert(&root_id, root_type)?;
            Ok(())
        })?;

        info!(root = %root, "repository bootstrapped");
        Ok(repo)
    }

    /// The root resource URI
    pub fn root(&self) -> &NamedNode {
        &self.root
    }

    /// Implementation-kind tag of a live resource
    pub fn kind_name(&self, uri: &NamedNode) -> EngineResult<&'static str> {
        Ok(self.kind_of(uri.as_str())?.name())
    }

    /// A copy of a resource's public state. The metadata graph is
    /// never exposed here.
    pub fn get_state(
        &self,
        uri: &NamedNode,
        parameters: Option<&Parameters>,
    ) -> EngineResult<Graph> {
        let kind = self.kind_of(uri.as_str())?;
        creation::check_parameters(parameters, kind.recognized_get_parameters())?;
        Ok(self
            .store
            .graph(uri.as_str())
            .cloned()
            .unwrap_or_default())
    }

    /// Current weak validation tag of a resource, if one was stamped
    pub fn etag(&self, uri: &NamedNode) -> Option<String> {
        let meta_id = vocab::metadata_graph_id(uri.as_str());
        let subject = Subject::Named(uri.clone());
        self.store
            .graph(&meta_id)?
            .objects_for(&subject, &vocab::tb_has_etag())
            .into_iter()
            .find_map(|o| o.as_literal().map(|l| l.value().to_string()))
    }

    /// Untrusted edit of one resource.
    ///
    /// The closure mutates a working copy (empty when `clear`); the
    /// result is completed, checked against the kind's constraints and
    /// semantic rules, and only then applied to the live graph as a
    /// minimal add/remove delta. Any rejection or failure leaves the
    /// store untouched.
    pub fn edit<F>(
        &mut self,
        uri: &NamedNode,
        parameters: Option<&Parameters>,
        clear: bool,
        f: F,
    ) -> EngineResult<()>
    where
        F: FnOnce(&mut Graph),
    {
        let kind = self.kind_of(uri.as_str())?;
        creation::check_parameters(parameters, kind.recognized_edit_parameters())?;

        let _guard = if kind.lock_protected() {
            Some(
                self.locks
                    .acquire(uri.as_str(), self.config.lock_timeout())?,
            )
        } else {
            None
        };
        self.edits.begin_untrusted(uri.as_str())?;
        let result = self.run_untrusted_edit(uri, kind, clear, f);
        self.edits.end_untrusted(uri.as_str());
        result
    }

    fn run_untrusted_edit<F>(
        &mut self,
        uri: &NamedNode,
        kind: &'static dyn ResourceKind,
        clear: bool,
        f: F,
    ) -> EngineResult<()>
    where
        F: FnOnce(&mut Graph),
    {
        let live = self
            .store
            .graph(uri.as_str())
            .cloned()
            .unwrap_or_default();
        kind.prepare_edit(uri, &live);
        let mut working = if clear { Graph::new() } else { live.clone() };
        f(&mut working);
        kind.complete_new_graph(uri, &mut working);

        let (added, removed) = live.diff(&working);
        let diag = constraints::check_graph(
            kind.constraints(),
            uri,
            &kind.rdf_type(),
            &working,
            Some((added.as_slice(), removed.as_slice())),
        )
        .combine(kind.check_extra(uri, &working));
        diag.into_result()?;

        debug!(uri = %uri, added = added.len(), removed = removed.len(), "applying edit delta");
        match self.apply_and_commit(uri.as_str(), kind.name(), &added, &removed) {
            Ok(()) => {
                kind.ack_edit(uri, &working);
                Ok(())
            }
            Err(e) => {
                if let Err(rb) = self.store.rollback() {
                    warn!(uri = %uri, error = %rb, "rollback after failed edit also failed");
                }
                Err(e)
            }
        }
    }

    fn apply_and_commit(
        &mut self,
        graph_id: &str,
        kind_name: &str,
        added: &[Triple],
        removed: &[Triple],
    ) -> EngineResult<()> {
        for t in removed {
            self.store.remove(graph_id, &TriplePattern::exact(t))?;
        }
        for t in added {
            self.store.insert(graph_id, t.clone())?;
        }
        self.stamp_metadata(graph_id, kind_name)?;
        self.store.commit()?;
        Ok(())
    }

    /// Trusted edit of one resource.
    ///
    /// The closure writes to the live store directly. Trusted scopes
    /// nest (same parameters or none); metadata stamping and the
    /// commit happen only when the outermost scope closes cleanly. On
    /// error the whole uncommitted batch is rolled back, best-effort.
    pub fn with_trusted_edit<R, F>(
        &mut self,
        uri: &str,
        parameters: Option<&Parameters>,
        f: F,
    ) -> EngineResult<R>
    where
        F: FnOnce(&mut Self) -> EngineResult<R>,
    {
        let outermost = self.edits.begin_trusted(uri, parameters)?;
        if outermost {
            if let (Some(kind), Some(graph)) =
                (self.registry.get(uri).copied(), self.store.graph(uri))
            {
                kind.prepare_edit(&NamedNode::new_unchecked(uri.to_string()), graph);
            }
        }
        let result = f(self);
        let closing = self.edits.end_trusted(uri)?;

        match result {
            Ok(value) => {
                if closing {
                    if let Some(kind) = self.registry.get(uri).copied() {
                        if let Some(graph) = self.store.graph(uri) {
                            kind.ack_edit(&NamedNode::new_unchecked(uri.to_string()), graph);
                        }
                        self.stamp_metadata(uri, kind.name())?;
                    }
                    self.store.commit()?;
                }
                Ok(value)
            }
            Err(e) => {
                if closing {
                    if let Err(rb) = self.store.rollback() {
                        warn!(uri, error = %rb, "rollback after failed trusted edit also failed");
                    }
                }
                Err(e)
            }
        }
    }

    /// Create a new resource from a posted graph, under the
    /// container's lock.
    ///
    /// Locates the created node (or takes `created_hint` from a
    /// trusted caller), elects the child's kind from its declared
    /// rdf:type(s) (or `type_hint`), mints or resolves its URI,
    /// rewrites the blank node, completes and checks the graph, and
    /// persists child graph, metadata and the parent's acknowledgment
    /// triples in one committed batch. Nothing persists on any
    /// failure.
    pub fn post_graph(
        &mut self,
        container: &NamedNode,
        posted: Graph,
        parameters: Option<&Parameters>,
        created_hint: Option<CreatedNode>,
        type_hint: Option<&NamedNode>,
    ) -> EngineResult<Vec<NamedNode>> {
        let container_kind = self.kind_of(container.as_str())?;
        if !container_kind.is_container() {
            return Err(EngineError::ProtocolViolation(format!(
                "<{}> does not accept new children",
                container.as_str()
            )));
        }
        creation::check_parameters(parameters, container_kind.recognized_post_parameters())?;

        let _guard = self
            .locks
            .acquire(container.as_str(), self.config.lock_timeout())?;
        let result = self.run_creation(
            container,
            container_kind,
            posted,
            parameters,
            created_hint,
            type_hint,
        );
        if result.is_err() {
            if let Err(rb) = self.store.rollback() {
                warn!(container = %container, error = %rb, "rollback after failed creation also failed");
            }
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn run_creation(
        &mut self,
        container: &NamedNode,
        container_kind: &'static dyn ResourceKind,
        mut posted: Graph,
        parameters: Option<&Parameters>,
        created_hint: Option<CreatedNode>,
        type_hint: Option<&NamedNode>,
    ) -> EngineResult<Vec<NamedNode>> {
        let container_graph = self
            .store
            .graph(container.as_str())
            .cloned()
            .unwrap_or_default();

        let created = match created_hint {
            Some(c) => c,
            None => identity::find_created(container, &posted)
                .ok_or(EngineError::CreatedNotFound)?,
        };
        creation::check_suitable(container, &container_graph, &created)?;
        let child_kind = creation::elect_child_kind(container_kind, &created, &posted, type_hint)?;
        let id_param = parameters.and_then(|p| p.get("id")).map(String::as_str);

        let uri = match &created {
            CreatedNode::Named(named) => {
                if let Some(id) = id_param {
                    let resolved = identity::resolve_id(
                        container,
                        id,
                        child_kind.is_container(),
                        &container_graph,
                    )?;
                    if resolved != *named {
                        return Err(EngineError::IdentityConflict(format!(
                            "id {:?} does not name the posted resource <{}>",
                            id,
                            named.as_str()
                        )));
                    }
                }
                named.clone()
            }
            CreatedNode::Blank(blank) => {
                let uri = match id_param {
                    Some(id) => identity::resolve_id(
                        container,
                        id,
                        child_kind.is_container(),
                        &container_graph,
                    )?,
                    None => identity::mint_uri(
                        container,
                        &container_graph,
                        child_kind.uri_prefix(),
                        child_kind.is_container(),
                    )?,
                };
                posted.rewrite_blank(blank, &uri);
                uri
            }
        };
        if self.registry.contains_key(uri.as_str()) {
            return Err(EngineError::IdentityConflict(uri.as_str().to_string()));
        }

        child_kind.complete_new_graph(&uri, &mut posted);
        let diag = constraints::check_graph(
            child_kind.constraints(),
            &uri,
            &child_kind.rdf_type(),
            &posted,
            None,
        )
        .combine(child_kind.check_extra(&uri, &posted));
        diag.into_result()?;

        for t in posted.sorted() {
            self.store.insert(uri.as_str(), t)?;
        }
        self.stamp_metadata(uri.as_str(), child_kind.name())?;

        let ack = container_kind.ack_new_child(container, &uri);
        let parent_id = container.as_str().to_string();
        self.with_trusted_edit(container.as_str(), None, move |repo| {
            for t in ack {
                repo.store.insert(&parent_id, t)?;
            }
            Ok(())
        })?;

        self.tombstones.remove(uri.as_str());
        self.registry
            .insert(uri.as_str().to_string(), child_kind);
        info!(container = %container, created = %uri, kind = child_kind.name(), "resource created");
        Ok(vec![uri])
    }

    /// Delete a resource: veto-checked, then the parent's contains
    /// edge and both graphs go in one committed batch, the lock token
    /// is destroyed and the registry entry becomes a tombstone.
    pub fn delete(
        &mut self,
        uri: &NamedNode,
        parameters: Option<&Parameters>,
    ) -> EngineResult<()> {
        let kind = self.kind_of(uri.as_str())?;
        creation::check_parameters(parameters, kind.recognized_delete_parameters())?;

        let graph = self
            .store
            .graph(uri.as_str())
            .cloned()
            .unwrap_or_default();
        kind.check_deletable(uri, &graph).into_result()?;

        let parent_id = self.parent_of(uri).ok_or_else(|| {
            EngineError::ProtocolViolation(format!(
                "no parent container holds <{}>",
                uri.as_str()
            ))
        })?;
        let _guard = self.locks.acquire(&parent_id, self.config.lock_timeout())?;

        let target = uri.as_str().to_string();
        let meta_id = vocab::metadata_graph_id(uri.as_str());
        let contains_pattern = TriplePattern::any()
            .with_predicate(vocab::tb_contains())
            .with_object(uri.clone());
        let parent_for_edit = parent_id.clone();
        self.with_trusted_edit(&parent_id, None, move |repo| {
            repo.store.remove(&parent_for_edit, &contains_pattern)?;
            repo.store.drop_graph(&target)?;
            if repo.store.contains_graph(&meta_id) {
                repo.store.drop_graph(&meta_id)?;
            }
            Ok(())
        })?;

        self.locks.destroy(uri.as_str())?;
        self.registry.remove(uri.as_str());
        self.tombstones.insert(uri.as_str().to_string());
        kind.ack_delete(uri);
        info!(uri = %uri, "resource deleted");
        Ok(())
    }

    /// The container whose graph holds a contains-edge to `uri`
    fn parent_of(&self, uri: &NamedNode) -> Option<String> {
        let child = Object::Named(uri.clone());
        self.registry
            .iter()
            .filter(|(graph_id, k)| k.is_container() && graph_id.as_str() != uri.as_str())
            .find(|(graph_id, _)| {
                self.store
                    .graph(graph_id)
                    .is_some_and(|g| !g.subjects_for(&vocab::tb_contains(), &child).is_empty())
            })
            .map(|(graph_id, _)| graph_id.clone())
    }

    fn kind_of(&self, uri: &str) -> EngineResult<&'static dyn ResourceKind> {
        if self.tombstones.contains(uri) {
            return Err(EngineError::Deleted(uri.to_string()));
        }
        self.registry
            .get(uri)
            .copied()
            .ok_or_else(|| EngineError::NotFound(uri.to_string()))
    }

    /// Refresh a resource's metadata graph: implementation tag, weak
    /// validation tag over the sorted public triples, last-modified
    /// timestamp.
    fn stamp_metadata(&mut self, uri: &str, kind_name: &str) -> EngineResult<()> {
        let etag = {
            let mut hasher = Sha256::new();
            if let Some(graph) = self.store.graph(uri) {
                for t in graph.sorted() {
                    hasher.update(t.to_string().as_bytes());
                }
            }
            format!("{:x}", hasher.finalize())
        };

        let meta_id = vocab::metadata_graph_id(uri);
        self.store.remove(&meta_id, &TriplePattern::any())?;
        let subject = NamedNode::new_unchecked(uri.to_string());
        self.store.insert(
            &meta_id,
            Triple::new(
                subject.clone(),
                vocab::tb_has_implementation(),
                Literal::simple(kind_name),
            ),
        )?;
        self.store.insert(
            &meta_id,
            Triple::new(
                subject.clone(),
                vocab::tb_has_etag(),
                Literal::simple(etag),
            ),
        )?;
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        self.store.insert(
            &meta_id,
            Triple::new(
                subject,
                vocab::tb_last_modified(),
                Literal::typed(now, vocab::xsd_date_time()),
            ),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::BlankNode;

    fn repository() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new("http://x/", dir.path().join("locks"));
        let repo = Repository::new(config).unwrap();
        (dir, repo)
    }

    fn post_base(repo: &mut Repository, id: &str) -> NamedNode {
        let blank = BlankNode::new();
        let mut posted = Graph::new();
        posted.insert(Triple::new(
            blank.clone(),
            vocab::rdf_type(),
            vocab::tb_base(),
        ));
        posted.insert(Triple::new(
            repo.root().clone(),
            vocab::tb_contains(),
            blank,
        ));
        let mut p = Parameters::new();
        p.insert("id".to_string(), id.to_string());
        let root = repo.root().clone();
        repo.post_graph(&root, posted, Some(&p), None, None)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_bootstrap_creates_typed_root() {
        let (_dir, repo) = repository();
        let state = repo.get_state(&repo.root().clone(), None).unwrap();
        assert!(state.contains(&Triple::new(
            repo.root().clone(),
            vocab::rdf_type(),
            vocab::tb_root(),
        )));
        assert!(repo.etag(repo.root()).is_some());
    }

    #[test]
    fn test_post_base_with_id_label() {
        let (_dir, mut repo) = repository();
        let base = post_base(&mut repo, "base1");
        assert_eq!(base.as_str(), "http://x/base1/");

        let root_state = repo.get_state(&repo.root().clone(), None).unwrap();
        assert!(root_state.contains(&Triple::new(
            repo.root().clone(),
            vocab::tb_contains(),
            base.clone(),
        )));
        assert_eq!(repo.kind_name(&base).unwrap(), "Base");
    }

    #[test]
    fn test_get_state_never_exposes_metadata() {
        let (_dir, repo) = repository();
        let state = repo.get_state(&repo.root().clone(), None).unwrap();
        assert!(!state
            .iter()
            .any(|t| t.predicate == vocab::tb_has_etag()
                || t.predicate == vocab::tb_last_modified()));
    }

    #[test]
    fn test_unknown_uri_not_found() {
        let (_dir, repo) = repository();
        let ghost = NamedNode::new("http://x/nope/").unwrap();
        assert!(matches!(
            repo.get_state(&ghost, None),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_unrecognized_post_parameter_rejected() {
        let (_dir, mut repo) = repository();
        let mut p = Parameters::new();
        p.insert("nope".to_string(), "x".to_string());
        let root = repo.root().clone();
        assert!(matches!(
            repo.post_graph(&root, Graph::new(), Some(&p), None, None),
            Err(EngineError::UnrecognizedParameter(_))
        ));
    }

    #[test]
    fn test_post_to_leaf_rejected() {
        let (_dir, mut repo) = repository();
        let base = post_base(&mut repo, "base1");

        let blank = BlankNode::new();
        let mut posted = Graph::new();
        posted.insert(Triple::new(
            blank.clone(),
            vocab::rdf_type(),
            vocab::tb_trace_model(),
        ));
        posted.insert(Triple::new(base.clone(), vocab::tb_contains(), blank));
        let model = repo
            .post_graph(&base, posted, None, None, None)
            .unwrap()
            .remove(0);

        assert!(matches!(
            repo.post_graph(&model, Graph::new(), None, None, None),
            Err(EngineError::ProtocolViolation(_))
        ));
    }
}
