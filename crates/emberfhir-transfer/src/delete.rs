//! Reverse-order delete resolution.
//!
//! Deleting resources that other resources still reference breaks
//! referential integrity, so deletion proceeds in reverse dependency
//! order: the reference graph is built, its edges flipped, and the same
//! frontier peel applied. Referencing resources come out before the
//! resources they reference.

use tracing::debug;

use emberfhir_core::{ReferenceFieldRegistry, Resource};

use crate::error::{Result, TransferError};
use crate::graph::ReferenceGraph;

/// Lazy sequence of delete batches.
///
/// Each item is a batch of resources nothing still depends on, safe to
/// submit as one bulk-delete transaction. The caller drives submission and
/// may stop early; the graph advances only when [`next`] is called.
///
/// A cyclic input surfaces as one `Err(UnresolvableGraph)` item, after
/// which the sequence ends.
///
/// [`next`]: Iterator::next
#[derive(Debug)]
pub struct DeleteBatches {
    graph: ReferenceGraph,
    poisoned: bool,
}

impl DeleteBatches {
    /// Plans deletion of `resources`. References to resources outside the
    /// set are ignored: the server may hold dependents this client never
    /// saw, but those are the caller's responsibility, not a reason to
    /// refuse the plan.
    pub fn new(resources: Vec<Resource>, registry: &ReferenceFieldRegistry) -> Result<Self> {
        let graph = ReferenceGraph::build(resources, registry)?.reverse();
        debug!(nodes = graph.len(), "planned delete resolution");
        Ok(Self {
            graph,
            poisoned: false,
        })
    }

    /// Resources remaining to be yielded.
    pub fn remaining(&self) -> usize {
        self.graph.len()
    }
}

impl Iterator for DeleteBatches {
    type Item = Result<Vec<Resource>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.poisoned || self.graph.is_empty() {
                return None;
            }

            let frontier = self.graph.frontier();
            if frontier.is_empty() {
                self.poisoned = true;
                return Some(Err(TransferError::UnresolvableGraph {
                    remaining: self.graph.node_keys(),
                }));
            }

            // Placeholder nodes for out-of-set targets carry nothing to
            // delete; drop them and move on to the next layer if the
            // whole frontier was placeholders.
            let batch: Vec<Resource> = frontier
                .iter()
                .filter_map(|key| self.graph.payload(key).cloned())
                .collect();
            self.graph.remove_nodes(&frontier);

            if !batch.is_empty() {
                return Some(Ok(batch));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfhir_core::ResourceType;
    use serde_json::json;

    fn registry() -> ReferenceFieldRegistry {
        ReferenceFieldRegistry::common()
    }

    fn patient(id: &str) -> Resource {
        Resource::new(ResourceType::Patient).with_id(id)
    }

    fn condition(id: &str, subject: &str) -> Resource {
        Resource::new(ResourceType::Condition)
            .with_id(id)
            .with_field("subject", json!({"reference": subject}))
    }

    fn keys(batch: &[Resource]) -> Vec<String> {
        batch.iter().map(Resource::local_key).collect()
    }

    #[test]
    fn test_dependents_deleted_first() {
        let batches: Vec<_> = DeleteBatches::new(
            vec![patient("p"), condition("c", "Patient/p")],
            &registry(),
        )
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(keys(&batches[0]), vec!["Condition/c"]);
        assert_eq!(keys(&batches[1]), vec!["Patient/p"]);
    }

    #[test]
    fn test_three_layers_reverse_creation_order() {
        let encounter = Resource::new(ResourceType::Encounter)
            .with_id("e")
            .with_field("subject", json!({"reference": "Patient/p"}));
        let observation = Resource::new(ResourceType::Observation)
            .with_id("o")
            .with_field("subject", json!({"reference": "Patient/p"}))
            .with_field("encounter", json!({"reference": "Encounter/e"}));

        let batches: Vec<_> =
            DeleteBatches::new(vec![patient("p"), encounter, observation], &registry())
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();

        assert_eq!(keys(&batches[0]), vec!["Observation/o"]);
        assert_eq!(keys(&batches[1]), vec!["Encounter/e"]);
        assert_eq!(keys(&batches[2]), vec!["Patient/p"]);
    }

    #[test]
    fn test_independent_resources_form_one_batch() {
        let batches: Vec<_> =
            DeleteBatches::new(vec![patient("p-1"), patient("p-2")], &registry())
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(keys(&batches[0]), vec!["Patient/p-1", "Patient/p-2"]);
    }

    #[test]
    fn test_out_of_set_references_are_ignored() {
        // The condition references a patient we are not deleting.
        let batches: Vec<_> =
            DeleteBatches::new(vec![condition("c", "Patient/kept")], &registry())
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(keys(&batches[0]), vec!["Condition/c"]);
    }

    #[test]
    fn test_caller_can_stop_early() {
        let mut batches = DeleteBatches::new(
            vec![patient("p"), condition("c", "Patient/p")],
            &registry(),
        )
        .unwrap();

        let first = batches.next().unwrap().unwrap();
        assert_eq!(keys(&first), vec!["Condition/c"]);
        assert_eq!(batches.remaining(), 1);
        drop(batches);
    }

    #[test]
    fn test_cycle_yields_single_error_then_ends() {
        let mut registry = registry();
        registry.register(
            ResourceType::Custom("Link".into()),
            vec![emberfhir_core::ReferenceFieldSpec::single("other")],
        );
        let x = Resource::new(ResourceType::Custom("Link".into()))
            .with_id("x")
            .with_field("other", json!({"reference": "Link/y"}));
        let y = Resource::new(ResourceType::Custom("Link".into()))
            .with_id("y")
            .with_field("other", json!({"reference": "Link/x"}));

        let mut batches = DeleteBatches::new(vec![x, y], &registry).unwrap();
        assert!(matches!(
            batches.next(),
            Some(Err(TransferError::UnresolvableGraph { .. }))
        ));
        assert!(batches.next().is_none());
    }
}
