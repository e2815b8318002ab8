//! Working-set closure.
//!
//! A set of resources handed to the transfer engine may reference
//! resources that are not in the set. Before a graph can be drained those
//! gaps must either be fetched from the origin server or reported, all of
//! them at once, so the caller can fix every gap in one go.

use indexmap::IndexSet;
use tracing::debug;

use emberfhir_core::{Reference, ReferenceFieldRegistry, Resource};

use crate::error::{Result, TransferError};
use crate::extract::extract_references;
use crate::server::TransferSource;

/// Distinct references whose targets are absent from `resources`' own
/// identifiers, in first-seen order.
pub fn missing_references(
    resources: &[Resource],
    registry: &ReferenceFieldRegistry,
) -> Result<Vec<Reference>> {
    let present: IndexSet<String> = resources
        .iter()
        .filter_map(Resource::relative_path)
        .collect();

    let mut seen = IndexSet::new();
    let mut missing = Vec::new();
    for resource in resources {
        for extracted in extract_references(resource, registry)? {
            let key = extracted.reference.to_relative();
            if !present.contains(&key) && seen.insert(key) {
                missing.push(extracted.reference);
            }
        }
    }
    Ok(missing)
}

/// Ensures `resources` is closed under references.
///
/// With `auto_fetch` enabled, gaps are fetched from `source` and appended;
/// fetched resources can themselves reference further resources, so the
/// check repeats until a fixed point. With `auto_fetch` disabled, any gap
/// fails with one aggregated [`TransferError::MissingReferences`] listing
/// every missing `Type/id`.
pub async fn complete_resources(
    mut resources: Vec<Resource>,
    source: &dyn TransferSource,
    registry: &ReferenceFieldRegistry,
    auto_fetch: bool,
) -> Result<Vec<Resource>> {
    loop {
        let missing = missing_references(&resources, registry)?;
        if missing.is_empty() {
            return Ok(resources);
        }
        if !auto_fetch {
            return Err(TransferError::MissingReferences(
                missing.iter().map(Reference::to_relative).collect(),
            ));
        }

        debug!(count = missing.len(), "fetching missing referenced resources");
        let fetched = source.get_many(&missing).await?;

        // A source that cannot produce the gaps must not send the loop
        // around unchanged.
        let fetched_keys: IndexSet<String> =
            fetched.iter().filter_map(Resource::relative_path).collect();
        let unfetched: Vec<String> = missing
            .iter()
            .map(Reference::to_relative)
            .filter(|key| !fetched_keys.contains(key))
            .collect();
        if !unfetched.is_empty() {
            return Err(TransferError::MissingReferences(unfetched));
        }

        resources.extend(fetched);
    }
}
