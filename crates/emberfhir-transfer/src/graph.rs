//! The reference graph.
//!
//! Nodes are keyed by string identity (`Type/id`, or a surrogate key for
//! resources without one) and carry the resource payload, `None` when the
//! node is only known as a dangling reference target. An edge `u -> v`
//! means `v` holds a reference to `u`: `u` must exist on a server before
//! `v` can be created there.
//!
//! Everything is plain value tables (node map plus adjacency lists), so
//! the graph can be mutated in place while it is drained. A graph is
//! built fresh per transfer or delete call and discarded afterwards.

use indexmap::IndexMap;

use emberfhir_core::{ReferenceFieldRegistry, Resource};

use crate::error::Result;
use crate::extract::extract_references;

/// Metadata on one reference edge: which field of the referencing resource
/// holds the pointer, and whether that field is list-valued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMeta {
    pub field: String,
    pub is_list: bool,
}

/// Directed graph of resource dependencies.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    /// Node key -> payload. `None` marks a dangling reference target that
    /// is not part of the working set.
    nodes: IndexMap<String, Option<Resource>>,
    preds: IndexMap<String, Vec<String>>,
    succs: IndexMap<String, Vec<String>>,
    /// `(from, to)` -> metadata. Parallel references between the same pair
    /// of resources (two fields pointing at the same target) share the
    /// edge and stack their metadata.
    edges: IndexMap<(String, String), Vec<EdgeMeta>>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the dependency graph of `resources`.
    ///
    /// Every input resource appears exactly once as a node, keyed by
    /// [`Resource::local_key`]. A resource referenced before (or without
    /// ever) being visited gets a placeholder node that is filled in when
    /// the resource itself shows up.
    pub fn build(resources: Vec<Resource>, registry: &ReferenceFieldRegistry) -> Result<Self> {
        let mut graph = Self::new();
        for resource in resources {
            let key = resource.local_key();
            let references = extract_references(&resource, registry)?;
            graph.insert_resource(key.clone(), resource);
            for extracted in references {
                graph.add_edge(
                    extracted.reference.to_relative(),
                    key.clone(),
                    EdgeMeta {
                        field: extracted.field,
                        is_list: extracted.is_list,
                    },
                );
            }
        }
        Ok(graph)
    }

    fn ensure_node(&mut self, key: &str) {
        if !self.nodes.contains_key(key) {
            self.nodes.insert(key.to_string(), None);
            self.preds.insert(key.to_string(), Vec::new());
            self.succs.insert(key.to_string(), Vec::new());
        }
    }

    /// Inserts or fills in the payload of a node without duplicating it.
    fn insert_resource(&mut self, key: String, resource: Resource) {
        self.ensure_node(&key);
        self.nodes[&key] = Some(resource);
    }

    fn add_edge(&mut self, from: String, to: String, meta: EdgeMeta) {
        self.ensure_node(&from);
        self.ensure_node(&to);
        if !self.succs[&from].contains(&to) {
            self.succs[&from].push(to.clone());
            self.preds[&to].push(from.clone());
        }
        self.edges.entry((from, to)).or_default().push(meta);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node_keys(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn payload(&self, key: &str) -> Option<&Resource> {
        self.nodes.get(key).and_then(Option::as_ref)
    }

    pub fn payload_mut(&mut self, key: &str) -> Option<&mut Resource> {
        self.nodes.get_mut(key).and_then(Option::as_mut)
    }

    /// Keys of nodes known only as reference targets, with no payload in
    /// the working set.
    pub fn missing_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(_, payload)| payload.is_none())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Nodes with no unresolved incoming dependency, in insertion order.
    pub fn frontier(&self) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|key| self.preds[*key].is_empty())
            .cloned()
            .collect()
    }

    pub fn successors(&self, key: &str) -> &[String] {
        self.succs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Field metadata of the edge `from -> to`; one entry per referencing
    /// field. Empty if no such edge exists.
    pub fn edge_metas(&self, from: &str, to: &str) -> &[EdgeMeta] {
        self.edges
            .get(&(from.to_string(), to.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Removes the given nodes and every edge touching them. Removing a
    /// resolved frontier exposes the next layer as predecessor-free.
    pub fn remove_nodes(&mut self, keys: &[String]) {
        for key in keys {
            if self.nodes.shift_remove(key).is_none() {
                continue;
            }
            for succ in self.succs.shift_remove(key).unwrap_or_default() {
                if let Some(preds) = self.preds.get_mut(&succ) {
                    preds.retain(|p| p != key);
                }
                self.edges.shift_remove(&(key.clone(), succ));
            }
            for pred in self.preds.shift_remove(key).unwrap_or_default() {
                if let Some(succs) = self.succs.get_mut(&pred) {
                    succs.retain(|s| s != key);
                }
                self.edges.shift_remove(&(pred, key.clone()));
            }
        }
    }

    /// The same nodes with every edge direction flipped. Used by the
    /// delete resolver, where consumers must go before their dependencies.
    pub fn reverse(mut self) -> Self {
        std::mem::swap(&mut self.preds, &mut self.succs);
        let edges = std::mem::take(&mut self.edges);
        self.edges = edges
            .into_iter()
            .map(|((from, to), meta)| ((to, from), meta))
            .collect();
        self
    }
}
