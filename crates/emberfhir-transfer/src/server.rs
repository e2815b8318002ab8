//! Server capabilities the transfer engine consumes.
//!
//! The engine never talks HTTP itself; it drives opaque collaborators
//! through these traits. Implementations encapsulate transport, auth,
//! retries, and pagination. They must be thread-safe (`Send + Sync`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use emberfhir_core::{Reference, Resource};

use crate::error::Result;

/// One successfully created resource: the server-assigned reference plus
/// the resource as it was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResult {
    pub reference: Reference,
    pub resource: Resource,
}

/// A server resources can be created on.
///
/// `bulk_create` submits a batch as one operation and returns one
/// [`CreateResult`] per submitted resource, **in submission order**. The
/// engine matches results to submissions by position; an implementation
/// that cannot guarantee order must not implement this trait.
#[async_trait]
pub trait TransferTarget: Send + Sync {
    async fn bulk_create(&self, resources: Vec<Resource>) -> Result<Vec<CreateResult>>;
}

/// A server missing resources can be fetched from.
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// Fetches the referenced resources. Implementations should error on
    /// unknown references rather than silently omitting them; the engine
    /// treats anything still absent afterwards as a missing reference.
    async fn get_many(&self, references: &[Reference]) -> Result<Vec<Resource>>;
}

/// Knobs for a transfer run.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Upper bound on resources per bulk-create call. Frontier layers
    /// larger than this are split into sequential sub-batches whose
    /// results are reassembled in submission order.
    pub batch_size: usize,
    /// Fetch referenced resources that are absent from the working set
    /// from the origin server before building the graph. When disabled,
    /// gaps surface as an aggregated [`MissingReferences`] error.
    ///
    /// [`MissingReferences`]: crate::TransferError::MissingReferences
    pub auto_fetch_missing: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            auto_fetch_missing: true,
        }
    }
}
