use thiserror::Error;

use crate::reference::InvalidReference;

/// Core error types for EmberFHIR operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid FHIR resource type: {0}")]
    InvalidResourceType(String),

    #[error("Invalid FHIR ID: {0}")]
    InvalidId(String),

    #[error("Invalid FHIR DateTime: {0}")]
    InvalidDateTime(String),

    #[error("Invalid FHIR reference: {0}")]
    InvalidReference(#[from] InvalidReference),

    #[error("Resource is missing a resourceType field")]
    MissingResourceType,

    #[error("Resource {resource_type} has no server-assigned id")]
    MissingResourceId { resource_type: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidResourceType error
    pub fn invalid_resource_type(resource_type: impl Into<String>) -> Self {
        Self::InvalidResourceType(resource_type.into())
    }

    /// Create a new InvalidId error
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(datetime: impl Into<String>) -> Self {
        Self::InvalidDateTime(datetime.into())
    }

    /// Create a new MissingResourceId error
    pub fn missing_resource_id(resource_type: impl Into<String>) -> Self {
        Self::MissingResourceId {
            resource_type: resource_type.into(),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
