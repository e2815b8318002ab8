//! Response interpretation: Location headers, transaction-response
//! bundles, OperationOutcome diagnostics.

use serde::Serialize;
use serde_json::Value;

use emberfhir_core::{Reference, Resource};
use emberfhir_transfer::{CreateResult, LinkageMap};

use crate::bundle::Bundle;
use crate::error::{ClientError, Result};

/// What a client-level transfer returns: where things came from, where
/// they went, and the identity linkage between the two.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub origin: String,
    pub destination: String,
    pub created: Vec<CreateResult>,
    pub linkage: LinkageMap,
}

/// Parses a `Location` header or `response.location` value into the
/// reference it addresses.
///
/// Accepts `Type/id`, `Type/id/_history/version`, and absolute forms of
/// either.
pub fn parse_location(location: &str) -> Result<Reference> {
    let segments: Vec<&str> = location
        .trim()
        .trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let (resource_type, id, version) = match segments.iter().position(|s| *s == "_history") {
        Some(at) if at >= 2 => (
            segments[at - 2],
            segments[at - 1],
            segments.get(at + 1).copied(),
        ),
        Some(_) => {
            return Err(ClientError::response_shape(format!(
                "location {location:?} has _history but no Type/id prefix"
            )));
        }
        None if segments.len() >= 2 => (segments[segments.len() - 2], segments[segments.len() - 1], None),
        None => {
            return Err(ClientError::response_shape(format!(
                "location {location:?} does not address a resource"
            )));
        }
    };

    if !resource_type
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
    {
        return Err(ClientError::response_shape(format!(
            "location {location:?} does not contain a resource type"
        )));
    }

    Ok(match version {
        Some(version) => Reference::with_version(resource_type, id, version),
        None => Reference::new(resource_type, id),
    })
}

/// Matches a transaction-response bundle 1:1 with the submitted resources
/// by position and attaches the server-assigned identity to each.
///
/// The entry count is validated; beyond that, order preservation is a
/// contract the target server must honor (FHIR requires transaction
/// responses to be in submission order).
pub fn create_results(response: Bundle, submitted: Vec<Resource>) -> Result<Vec<CreateResult>> {
    if response.entry.len() != submitted.len() {
        return Err(ClientError::response_shape(format!(
            "transaction response has {} entries for {} submitted resources",
            response.entry.len(),
            submitted.len()
        )));
    }

    response
        .entry
        .into_iter()
        .zip(submitted)
        .map(|(entry, mut resource)| {
            let entry_response = entry.response.ok_or_else(|| {
                ClientError::response_shape("transaction response entry without response component")
            })?;
            let location = entry_response.location.as_deref().ok_or_else(|| {
                ClientError::response_shape(format!(
                    "transaction response entry without location (status {})",
                    entry_response.status
                ))
            })?;
            let reference = parse_location(location)?;
            resource.id = Some(reference.id.clone());
            Ok(CreateResult {
                reference,
                resource,
            })
        })
        .collect()
}

/// Pulls human-readable diagnostics out of an OperationOutcome error body.
pub fn operation_outcome_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if value.get("resourceType").and_then(Value::as_str) != Some("OperationOutcome") {
        return None;
    }
    let issues = value.get("issue")?.as_array()?;
    let messages: Vec<&str> = issues
        .iter()
        .filter_map(|issue| {
            issue
                .get("diagnostics")
                .or_else(|| issue.get("details").and_then(|d| d.get("text")))
                .and_then(Value::as_str)
        })
        .collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleEntry, BundleEntryResponse};
    use emberfhir_core::ResourceType;
    use serde_json::json;

    #[test]
    fn test_parse_relative_location() {
        let reference = parse_location("Patient/123/_history/1").unwrap();
        assert_eq!(reference.to_relative(), "Patient/123");
        assert_eq!(reference.version.as_deref(), Some("1"));
    }

    #[test]
    fn test_parse_absolute_location() {
        let reference =
            parse_location("http://fhir.example.org/r4/Observation/o-9/_history/3").unwrap();
        assert_eq!(reference.to_relative(), "Observation/o-9");
        assert_eq!(reference.version.as_deref(), Some("3"));
    }

    #[test]
    fn test_parse_location_without_history() {
        let reference = parse_location("http://fhir.example.org/r4/Patient/p-1").unwrap();
        assert_eq!(reference.to_relative(), "Patient/p-1");
        assert!(reference.version.is_none());
    }

    #[test]
    fn test_parse_location_rejects_garbage() {
        assert!(parse_location("").is_err());
        assert!(parse_location("no-resource-here").is_err());
        assert!(parse_location("lowercase/id").is_err());
    }

    fn response_entry(location: &str) -> BundleEntry {
        BundleEntry {
            response: Some(BundleEntryResponse {
                status: "201 Created".into(),
                location: Some(location.into()),
                ..BundleEntryResponse::default()
            }),
            ..BundleEntry::default()
        }
    }

    #[test]
    fn test_create_results_assigns_ids_in_order() {
        let response = Bundle {
            entry: vec![
                response_entry("Patient/srv-1/_history/1"),
                response_entry("Condition/srv-2/_history/1"),
            ],
            ..Bundle::transaction(vec![])
        };
        let submitted = vec![
            Resource::new(ResourceType::Patient),
            Resource::new(ResourceType::Condition),
        ];

        let results = create_results(response, submitted).unwrap();
        assert_eq!(results[0].reference.to_relative(), "Patient/srv-1");
        assert_eq!(results[0].resource.id.as_deref(), Some("srv-1"));
        assert_eq!(results[1].reference.to_relative(), "Condition/srv-2");
    }

    #[test]
    fn test_create_results_entry_count_mismatch() {
        let response = Bundle {
            entry: vec![response_entry("Patient/srv-1")],
            ..Bundle::transaction(vec![])
        };
        let submitted = vec![
            Resource::new(ResourceType::Patient),
            Resource::new(ResourceType::Condition),
        ];
        let err = create_results(response, submitted).unwrap_err();
        assert!(matches!(err, ClientError::ResponseShape(_)));
    }

    #[test]
    fn test_create_results_missing_location() {
        let response = Bundle {
            entry: vec![BundleEntry {
                response: Some(BundleEntryResponse {
                    status: "201 Created".into(),
                    ..BundleEntryResponse::default()
                }),
                ..BundleEntry::default()
            }],
            ..Bundle::transaction(vec![])
        };
        let err =
            create_results(response, vec![Resource::new(ResourceType::Patient)]).unwrap_err();
        assert!(matches!(err, ClientError::ResponseShape(_)));
    }

    #[test]
    fn test_operation_outcome_message() {
        let body = json!({
            "resourceType": "OperationOutcome",
            "issue": [
                {"severity": "error", "diagnostics": "subject is required"},
                {"severity": "error", "details": {"text": "invalid code"}}
            ]
        })
        .to_string();
        assert_eq!(
            operation_outcome_message(&body).unwrap(),
            "subject is required; invalid code"
        );
    }

    #[test]
    fn test_operation_outcome_message_on_other_bodies() {
        assert!(operation_outcome_message("not json").is_none());
        assert!(operation_outcome_message("{\"resourceType\":\"Patient\"}").is_none());
    }
}
