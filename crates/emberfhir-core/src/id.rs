//! Resource id helpers.
//!
//! FHIR logical ids are 1-64 characters from `[A-Za-z0-9.-]`. Resources
//! that have not been created on a server yet carry no id at all and are
//! keyed by a client-generated surrogate instead.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("id must be 1-64 characters, got {0}")]
    InvalidLength(usize),
    #[error("id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Generates a new v4 UUID usable as a FHIR id or surrogate key.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validates a logical id against the FHIR id grammar.
pub fn validate_id(id: &str) -> Result<(), IdError> {
    if id.is_empty() || id.len() > 64 {
        return Err(IdError::InvalidLength(id.len()));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
    {
        return Err(IdError::InvalidCharacter(bad));
    }
    Ok(())
}
