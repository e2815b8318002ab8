//! Reference-graph resolution and cross-server transfer.
//!
//! FHIR resources reference each other, and servers assign ids at creation
//! time, so moving a set of interrelated resources between servers is an
//! ordering problem: a resource cannot be created before everything it
//! references exists on the destination. This crate models the references
//! as a directed graph, drains it in topological layers against a target
//! server, rewrites references to the server-assigned ids as it goes, and
//! supports the reverse ordering for safe deletion.
//!
//! The engine is transport-agnostic: servers are opaque collaborators
//! behind [`TransferTarget`] and [`TransferSource`]. The companion
//! `emberfhir-client` crate implements both over HTTP.
//!
//! ```no_run
//! # async fn example(
//! #     source: &dyn emberfhir_transfer::TransferSource,
//! #     target: &dyn emberfhir_transfer::TransferTarget,
//! #     resources: Vec<emberfhir_core::Resource>,
//! # ) -> Result<(), emberfhir_transfer::TransferError> {
//! use emberfhir_core::ReferenceFieldRegistry;
//! use emberfhir_transfer::{TransferOptions, transfer_resources};
//!
//! let registry = ReferenceFieldRegistry::common();
//! let outcome = transfer_resources(
//!     resources,
//!     source,
//!     target,
//!     &registry,
//!     &TransferOptions::default(),
//! )
//! .await?;
//! println!("created {} resources", outcome.created.len());
//! # Ok(())
//! # }
//! ```

pub mod complete;
pub mod delete;
pub mod error;
pub mod extract;
pub mod graph;
pub mod resolve;
pub mod server;

pub use complete::{complete_resources, missing_references};
pub use delete::DeleteBatches;
pub use error::{Result, TransferError};
pub use extract::{ExtractedReference, extract_references};
pub use graph::{EdgeMeta, ReferenceGraph};
pub use resolve::{LinkageMap, TransferOutcome, resolve_transfer};
pub use server::{CreateResult, TransferOptions, TransferSource, TransferTarget};

use emberfhir_core::{ReferenceFieldRegistry, Resource};

/// Transfers a resource set from `source` to `target`.
///
/// Completes the set (fetching missing referenced resources from `source`
/// per `options.auto_fetch_missing`), builds the reference graph, and
/// drains it against `target`. This is the single entry point combining
/// the three stages; each is also available on its own.
pub async fn transfer_resources(
    resources: Vec<Resource>,
    source: &dyn TransferSource,
    target: &dyn TransferTarget,
    registry: &ReferenceFieldRegistry,
    options: &TransferOptions,
) -> Result<TransferOutcome> {
    let resources =
        complete_resources(resources, source, registry, options.auto_fetch_missing).await?;
    let graph = ReferenceGraph::build(resources, registry)?;
    resolve_transfer(graph, target, options).await
}
