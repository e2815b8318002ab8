//! FHIR reference parsing utilities.
//!
//! A reference is a typed pointer from one resource to another. On the wire
//! it is a string in one of several formats:
//! - Relative: `Patient/123`
//! - Versioned: `Patient/123/_history/1`
//! - Absolute URL: `http://example.org/fhir/Patient/123`
//! - Contained: `#contained-id` (cannot be resolved externally)
//! - URN: `urn:uuid:xxx` or `urn:oid:xxx` (cannot be resolved externally)
//!
//! Relative and same-server absolute references parse into a [`Reference`];
//! everything else produces a typed [`InvalidReference`] so callers can
//! decide whether to skip or fail. A syntactically broken string is never
//! silently dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A successfully parsed FHIR reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// The resource type (e.g., "Patient", "Observation")
    pub resource_type: String,
    /// The resource ID
    pub id: String,
    /// Optional version ID from `_history` suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Reference {
    /// Creates a new Reference.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            version: None,
        }
    }

    /// Creates a new Reference with a version.
    pub fn with_version(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            version: Some(version.into()),
        }
    }

    /// Returns the reference as a relative string (Type/id).
    pub fn to_relative(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }

    /// Returns the reference with version if present (Type/id/_history/version).
    pub fn to_versioned(&self) -> String {
        match &self.version {
            Some(v) => format!("{}/{}/_history/{}", self.resource_type, self.id, v),
            None => self.to_relative(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_relative())
    }
}

/// A reference string that does not resolve to a `Type/id` pair on the
/// server being worked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReference {
    /// A contained reference (starts with `#`)
    Contained(String),
    /// A URN reference (`urn:uuid:xxx` or `urn:oid:xxx`)
    Urn(String),
    /// An absolute URL pointing at a different server
    External(String),
    /// A malformed reference string
    Malformed(String),
}

impl InvalidReference {
    /// Contained, URN, and external references are legal FHIR that simply
    /// lives outside the working set; malformed strings are data errors.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl fmt::Display for InvalidReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contained(id) => write!(f, "contained reference: #{id}"),
            Self::Urn(urn) => write!(f, "URN reference: {urn}"),
            Self::External(url) => write!(f, "external reference: {url}"),
            Self::Malformed(reason) => write!(f, "malformed reference: {reason}"),
        }
    }
}

impl std::error::Error for InvalidReference {}

/// Parse a FHIR reference string into its components.
///
/// # Arguments
///
/// * `reference` - The reference string to parse
/// * `base_url` - Optional base URL of the server the reference was read
///   from. If provided, absolute URLs matching this base are treated as
///   local references.
///
/// # Examples
///
/// ```
/// use emberfhir_core::reference::parse_reference;
///
/// let r = parse_reference("Patient/123", None).unwrap();
/// assert_eq!(r.resource_type, "Patient");
/// assert_eq!(r.id, "123");
///
/// let r = parse_reference(
///     "http://localhost/fhir/Patient/123",
///     Some("http://localhost/fhir"),
/// ).unwrap();
/// assert_eq!(r.to_relative(), "Patient/123");
/// ```
pub fn parse_reference(
    reference: &str,
    base_url: Option<&str>,
) -> Result<Reference, InvalidReference> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(InvalidReference::Malformed("empty reference".to_string()));
    }

    if let Some(contained_id) = reference.strip_prefix('#') {
        return Err(InvalidReference::Contained(contained_id.to_string()));
    }

    if reference.starts_with("urn:") {
        return Err(InvalidReference::Urn(reference.to_string()));
    }

    let path = if reference.contains("://") {
        match base_url {
            Some(base) => {
                let normalized_base = base.trim_end_matches('/');
                if let Some(suffix) = reference.strip_prefix(normalized_base) {
                    suffix.trim_start_matches('/')
                } else {
                    return Err(InvalidReference::External(reference.to_string()));
                }
            }
            None => {
                return Err(InvalidReference::External(reference.to_string()));
            }
        }
    } else {
        reference
    };

    // Parse "ResourceType/id" or "ResourceType/id/_history/version"
    let parts: Vec<&str> = path.split('/').collect();

    if parts.len() < 2 {
        return Err(InvalidReference::Malformed(format!(
            "reference must contain at least Type/id: {reference}"
        )));
    }

    let resource_type = parts[0];
    let id = parts[1];

    if !resource_type
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
    {
        return Err(InvalidReference::Malformed(format!(
            "resource type must start with uppercase letter: {resource_type}"
        )));
    }

    if id.is_empty() {
        return Err(InvalidReference::Malformed(
            "resource id cannot be empty".to_string(),
        ));
    }

    let version = if parts.len() >= 4 && parts[2] == "_history" {
        Some(parts[3].to_string())
    } else {
        None
    };

    Ok(Reference {
        resource_type: resource_type.to_string(),
        id: id.to_string(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_relative_reference() {
        let r = parse_reference("Patient/123", None).unwrap();
        assert_eq!(r.resource_type, "Patient");
        assert_eq!(r.id, "123");
        assert_eq!(r.version, None);
    }

    #[test]
    fn test_versioned_reference() {
        let r = parse_reference("Patient/123/_history/2", None).unwrap();
        assert_eq!(r.resource_type, "Patient");
        assert_eq!(r.id, "123");
        assert_eq!(r.version, Some("2".to_string()));
    }

    #[test]
    fn test_absolute_url_with_matching_base() {
        let r = parse_reference(
            "http://localhost:8888/fhir/Patient/123",
            Some("http://localhost:8888/fhir"),
        )
        .unwrap();
        assert_eq!(r.resource_type, "Patient");
        assert_eq!(r.id, "123");
    }

    #[test]
    fn test_absolute_url_with_trailing_slash_base() {
        let r = parse_reference(
            "http://localhost:8888/fhir/Patient/123",
            Some("http://localhost:8888/fhir/"),
        )
        .unwrap();
        assert_eq!(r.to_relative(), "Patient/123");
    }

    #[test]
    fn test_absolute_url_without_base() {
        let result = parse_reference("http://localhost:8888/fhir/Patient/123", None);
        assert!(matches!(result, Err(InvalidReference::External(_))));
    }

    #[test]
    fn test_external_absolute_url() {
        let result = parse_reference(
            "http://other-server.com/fhir/Patient/123",
            Some("http://localhost:8888/fhir"),
        );
        assert!(matches!(result, Err(InvalidReference::External(_))));
    }

    #[test]
    fn test_contained_reference() {
        let result = parse_reference("#contained-id", None);
        assert!(matches!(result, Err(InvalidReference::Contained(id)) if id == "contained-id"));
    }

    #[test]
    fn test_urn_references() {
        let result = parse_reference("urn:uuid:550e8400-e29b-41d4-a716-446655440000", None);
        assert!(matches!(result, Err(InvalidReference::Urn(_))));

        let result = parse_reference("urn:oid:2.16.840.1.113883.4.642.3.1", None);
        assert!(matches!(result, Err(InvalidReference::Urn(_))));
    }

    #[test]
    fn test_invalid_lowercase_type() {
        let result = parse_reference("patient/123", None);
        assert!(matches!(result, Err(InvalidReference::Malformed(_))));
    }

    #[test]
    fn test_invalid_empty_id() {
        let result = parse_reference("Patient/", None);
        assert!(matches!(result, Err(InvalidReference::Malformed(_))));
    }

    #[test]
    fn test_invalid_no_slash() {
        let result = parse_reference("Patient123", None);
        assert!(matches!(result, Err(InvalidReference::Malformed(_))));
    }

    #[test]
    fn test_empty_and_whitespace_references() {
        assert!(matches!(
            parse_reference("", None),
            Err(InvalidReference::Malformed(_))
        ));
        assert!(matches!(
            parse_reference("  ", None),
            Err(InvalidReference::Malformed(_))
        ));
    }

    #[test]
    fn test_is_malformed() {
        assert!(parse_reference("bad", None).unwrap_err().is_malformed());
        assert!(
            !parse_reference("#inline", None)
                .unwrap_err()
                .is_malformed()
        );
        assert!(
            !parse_reference("urn:uuid:abc", None)
                .unwrap_err()
                .is_malformed()
        );
    }

    #[test]
    fn test_to_relative_and_versioned() {
        let r = Reference::new("Patient", "123");
        assert_eq!(r.to_relative(), "Patient/123");
        assert_eq!(r.to_versioned(), "Patient/123");

        let r = Reference::with_version("Patient", "123", "2");
        assert_eq!(r.to_versioned(), "Patient/123/_history/2");
    }

    #[test]
    fn test_display() {
        let r = Reference::new("Patient", "123");
        assert_eq!(format!("{r}"), "Patient/123");
    }

    #[test]
    fn test_serde_roundtrip() {
        let r = Reference::new("Condition", "c-1");
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("version").is_none());
        let back: Reference = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}
