//! Layered topological drain of a reference graph against a target server.
//!
//! The graph is peeled frontier by frontier: nodes without unresolved
//! dependencies are bulk-created on the target, their server-assigned
//! references are written into every dependent resource still in the
//! graph, and the resolved nodes are removed, exposing the next layer.
//! Layer `n+1` cannot be submitted before layer `n`'s references are
//! known, so layers are strictly sequential; only chunking within a layer
//! is an implementation detail.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use emberfhir_core::{Resource, parse_reference};

use crate::error::{Result, TransferError};
use crate::graph::{EdgeMeta, ReferenceGraph};
use crate::server::{CreateResult, TransferOptions, TransferTarget};

/// Origin node key -> destination reference string, for one transfer call.
/// Serializes as a flat JSON object should the caller want to persist it.
pub type LinkageMap = IndexMap<String, String>;

/// Everything a successful transfer produces.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub created: Vec<CreateResult>,
    pub linkage: LinkageMap,
}

/// Creates every resource in `graph` on `target` in dependency order,
/// rewriting references to the target's assigned ids along the way.
///
/// # Errors
///
/// - [`TransferError::MissingReferences`] if the graph still contains
///   placeholder nodes (establish closure first, see [`complete_resources`]).
/// - [`TransferError::UnresolvableGraph`] if the frontier goes empty while
///   nodes remain (cyclic input).
/// - [`TransferError::Transport`] if a bulk-create call fails; resources
///   created in earlier layers stay on the target, there is no rollback.
/// - [`TransferError::RewriteMismatch`] if a dependent resource does not
///   actually hold the placeholder the graph recorded for it.
///
/// [`complete_resources`]: crate::complete::complete_resources
pub async fn resolve_transfer(
    mut graph: ReferenceGraph,
    target: &dyn TransferTarget,
    options: &TransferOptions,
) -> Result<TransferOutcome> {
    let missing = graph.missing_nodes();
    if !missing.is_empty() {
        return Err(TransferError::MissingReferences(missing));
    }

    let total = graph.len();
    let mut created = Vec::with_capacity(total);
    let mut linkage = LinkageMap::with_capacity(total);
    let mut layer = 0usize;

    while !graph.is_empty() {
        let frontier = graph.frontier();
        if frontier.is_empty() {
            return Err(TransferError::UnresolvableGraph {
                remaining: graph.node_keys(),
            });
        }
        debug!(layer, resources = frontier.len(), nodes = ?frontier, "submitting layer");

        let payloads = frontier
            .iter()
            .map(|key| {
                graph
                    .payload(key)
                    .cloned()
                    .ok_or_else(|| TransferError::MissingPayload { node: key.clone() })
            })
            .collect::<Result<Vec<Resource>>>()?;

        let results = submit_chunked(target, payloads, options.batch_size).await?;
        if results.len() != frontier.len() {
            return Err(TransferError::ResponseMismatch {
                expected: frontier.len(),
                got: results.len(),
            });
        }

        for (key, result) in frontier.iter().zip(&results) {
            let destination = result.reference.to_relative();
            linkage.insert(key.clone(), destination.clone());
            update_successors(&mut graph, key, &destination)?;
        }

        created.extend(results);
        graph.remove_nodes(&frontier);
        layer += 1;
    }

    info!(resources = created.len(), layers = layer, "transfer resolved");
    Ok(TransferOutcome { created, linkage })
}

/// Splits a frontier into sub-batches of at most `batch_size` and
/// reassembles the results in submission order, keeping positional
/// matching valid across the whole layer.
async fn submit_chunked(
    target: &dyn TransferTarget,
    payloads: Vec<Resource>,
    batch_size: usize,
) -> Result<Vec<CreateResult>> {
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(payloads.len());
    for chunk in payloads.chunks(batch_size) {
        results.extend(target.bulk_create(chunk.to_vec()).await?);
    }
    Ok(results)
}

/// Writes `destination` into every still-pending resource that references
/// the just-resolved `node`.
fn update_successors(graph: &mut ReferenceGraph, node: &str, destination: &str) -> Result<()> {
    for successor in graph.successors(node).to_vec() {
        let metas = graph.edge_metas(node, &successor).to_vec();
        let resource = graph
            .payload_mut(&successor)
            .ok_or_else(|| TransferError::MissingPayload {
                node: successor.clone(),
            })?;
        for meta in &metas {
            rewrite_reference(resource, meta, node, destination)?;
        }
    }
    Ok(())
}

/// Rewrites one field (or one slot of a list field) from the placeholder
/// reference `original` to `destination`. Only the matching slot of a list
/// is touched; sibling entries stay as they are.
fn rewrite_reference(
    resource: &mut Resource,
    meta: &EdgeMeta,
    original: &str,
    destination: &str,
) -> Result<()> {
    let successor = resource.local_key();
    let mismatch = || TransferError::RewriteMismatch {
        node: original.to_string(),
        successor: successor.clone(),
        field: meta.field.clone(),
    };

    let Some(value) = resource.field_mut(&meta.field) else {
        return Err(mismatch());
    };

    if meta.is_list {
        let Some(items) = value.as_array_mut() else {
            return Err(mismatch());
        };
        match items.iter_mut().find(|item| points_at(&**item, original)) {
            Some(slot) => *slot = json!({ "reference": destination }),
            None => return Err(mismatch()),
        }
    } else {
        if !points_at(value, original) {
            return Err(mismatch());
        }
        *value = json!({ "reference": destination });
    }
    Ok(())
}

/// Whether a reference field value points at the node keyed `original`.
/// Tolerates versioned reference strings, which normalize to the same key.
fn points_at(value: &serde_json::Value, original: &str) -> bool {
    let text = match value {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(map) => map.get("reference").and_then(|v| v.as_str()),
        _ => None,
    };
    match text {
        Some(text) => {
            text == original
                || parse_reference(text, None)
                    .map(|r| r.to_relative() == original)
                    .unwrap_or(false)
        }
        None => false,
    }
}
