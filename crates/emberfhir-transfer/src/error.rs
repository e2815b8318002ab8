use thiserror::Error;

use emberfhir_core::CoreError;

/// Errors raised while building, completing, or draining a reference graph.
///
/// Everything here propagates synchronously to the caller of the transfer
/// or delete entry points; nothing is swallowed.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A reference string that cannot be parsed into `Type/id`. Raised at
    /// extraction time so a broken pointer never turns into a wrong edge.
    #[error("malformed reference {value:?} in field '{field}' of {node}: {reason}")]
    MalformedReference {
        node: String,
        field: String,
        value: String,
        reason: String,
    },

    /// References whose targets are neither in the working set nor
    /// fetchable. Aggregated: every gap is listed, not just the first.
    #[error("missing referenced resources: {}", .0.join(", "))]
    MissingReferences(Vec<String>),

    /// The frontier went empty while nodes remained, i.e. every remaining
    /// node still has an unresolved dependency. Cyclic inputs end up here.
    #[error("reference graph is unresolvable, {} nodes remain: {}", .remaining.len(), .remaining.join(", "))]
    UnresolvableGraph { remaining: Vec<String> },

    /// A successor's field did not contain the placeholder reference the
    /// graph says it should. Indicates inconsistent input, not a transport
    /// problem; retrying cannot help.
    #[error("reference to {node} not found in field '{field}' of {successor}")]
    RewriteMismatch {
        node: String,
        successor: String,
        field: String,
    },

    /// A node scheduled for submission has no resource payload.
    #[error("no resource payload for graph node {node}")]
    MissingPayload { node: String },

    /// The server answered a bulk submission with a different number of
    /// entries than were submitted, so positional matching is impossible.
    #[error("bulk response has {got} entries for {expected} submitted resources")]
    ResponseMismatch { expected: usize, got: usize },

    /// Failure in the underlying server collaborator. Aborts the whole
    /// operation; already-created layers are not rolled back.
    #[error("server request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TransferError {
    /// Wraps a collaborator error as a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
