//! Reference extraction.
//!
//! Scans one resource for outgoing references using the schema registry's
//! field descriptors. Read-only; the resource is never mutated.

use serde_json::Value;
use tracing::debug;

use emberfhir_core::{
    InvalidReference, Reference, ReferenceFieldRegistry, Resource, parse_reference,
};

use crate::error::{Result, TransferError};

/// One outgoing reference found on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedReference {
    /// Name of the field holding the reference.
    pub field: String,
    pub reference: Reference,
    /// Whether the field is list-valued, in which case a rewrite must
    /// target the one list slot holding this reference.
    pub is_list: bool,
}

/// Extracts every reference held by `resource`'s schema-known fields.
///
/// Singular reference fields yield at most one entry; list fields yield one
/// entry per element. Contained (`#x`), URN, and foreign-server references
/// are outside the working set and are skipped. A syntactically broken
/// reference string is a fatal [`TransferError::MalformedReference`];
/// dropping it would silently produce wrong graph edges downstream.
///
/// Resources with no schema-known reference fields (root entities such as
/// Patient without practitioners, or unregistered custom types) yield an
/// empty list.
pub fn extract_references(
    resource: &Resource,
    registry: &ReferenceFieldRegistry,
) -> Result<Vec<ExtractedReference>> {
    let node = resource.local_key();
    let mut references = Vec::new();

    for spec in registry.reference_fields(&resource.resource_type) {
        let Some(value) = resource.field(&spec.name) else {
            continue;
        };

        if spec.is_list {
            let Some(items) = value.as_array() else {
                // A scalar where the schema says list: treat the field as
                // malformed rather than guessing.
                return Err(malformed(&node, &spec.name, value, "expected an array"));
            };
            for item in items {
                if let Some(reference) = parse_entry(&node, &spec.name, item)? {
                    references.push(ExtractedReference {
                        field: spec.name.clone(),
                        reference,
                        is_list: true,
                    });
                }
            }
        } else if let Some(reference) = parse_entry(&node, &spec.name, value)? {
            references.push(ExtractedReference {
                field: spec.name.clone(),
                reference,
                is_list: false,
            });
        }
    }

    Ok(references)
}

/// Pulls the reference string out of a field value. FHIR encodes references
/// as `{"reference": "Type/id", ...}`; a bare string is accepted as well.
fn parse_entry(node: &str, field: &str, value: &Value) -> Result<Option<Reference>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.as_str(),
        Value::Object(map) => match map.get("reference") {
            Some(Value::String(s)) => s.as_str(),
            // Logical identifier-only or display-only references carry no
            // resolvable pointer.
            Some(Value::Null) | None => return Ok(None),
            Some(other) => {
                return Err(malformed(node, field, other, "reference must be a string"));
            }
        },
        other => {
            return Err(malformed(
                node,
                field,
                other,
                "expected a reference object or string",
            ));
        }
    };

    match parse_reference(text, None) {
        Ok(reference) => Ok(Some(reference)),
        Err(err @ InvalidReference::Malformed(_)) => {
            Err(malformed(node, field, value, &err.to_string()))
        }
        Err(skippable) => {
            debug!(node, field, reference = %skippable, "skipping non-local reference");
            Ok(None)
        }
    }
}

fn malformed(node: &str, field: &str, value: &Value, reason: &str) -> TransferError {
    TransferError::MalformedReference {
        node: node.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
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

    #[test]
    fn test_no_reference_fields() {
        let patient = Resource::new(ResourceType::Patient).with_id("p-1");
        let refs = extract_references(&patient, &registry()).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_singular_reference() {
        let condition = Resource::new(ResourceType::Condition)
            .with_id("c-1")
            .with_field("subject", json!({"reference": "Patient/p-1"}));

        let refs = extract_references(&condition, &registry()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].field, "subject");
        assert_eq!(refs[0].reference.to_relative(), "Patient/p-1");
        assert!(!refs[0].is_list);
    }

    #[test]
    fn test_bare_string_reference() {
        let condition = Resource::new(ResourceType::Condition)
            .with_field("subject", json!("Patient/p-1"));

        let refs = extract_references(&condition, &registry()).unwrap();
        assert_eq!(refs[0].reference.to_relative(), "Patient/p-1");
    }

    #[test]
    fn test_list_reference_field() {
        let observation = Resource::new(ResourceType::Observation)
            .with_id("o-1")
            .with_field(
                "hasMember",
                json!([
                    {"reference": "Observation/o-2"},
                    {"reference": "Observation/o-3"},
                ]),
            );

        let refs = extract_references(&observation, &registry()).unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.is_list && r.field == "hasMember"));
        assert_eq!(refs[1].reference.to_relative(), "Observation/o-3");
    }

    #[test]
    fn test_multiple_fields() {
        let observation = Resource::new(ResourceType::Observation)
            .with_field("subject", json!({"reference": "Patient/p-1"}))
            .with_field("encounter", json!({"reference": "Encounter/e-1"}))
            .with_field("performer", json!([{"reference": "Practitioner/dr-1"}]));

        let refs = extract_references(&observation, &registry()).unwrap();
        let relatives: Vec<String> = refs.iter().map(|r| r.reference.to_relative()).collect();
        assert_eq!(
            relatives,
            vec!["Patient/p-1", "Encounter/e-1", "Practitioner/dr-1"]
        );
    }

    #[test]
    fn test_malformed_reference_fails_loudly() {
        let condition = Resource::new(ResourceType::Condition)
            .with_id("c-1")
            .with_field("subject", json!({"reference": "no-separator"}));

        let err = extract_references(&condition, &registry()).unwrap_err();
        match err {
            TransferError::MalformedReference { node, field, .. } => {
                assert_eq!(node, "Condition/c-1");
                assert_eq!(field, "subject");
            }
            other => panic!("expected MalformedReference, got {other:?}"),
        }
    }

    #[test]
    fn test_contained_and_urn_references_skipped() {
        let observation = Resource::new(ResourceType::Observation)
            .with_field("subject", json!({"reference": "#contained-patient"}))
            .with_field("specimen", json!({"reference": "urn:uuid:abc"}));

        let refs = extract_references(&observation, &registry()).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_display_only_reference_skipped() {
        let condition = Resource::new(ResourceType::Condition)
            .with_field("subject", json!({"display": "Jane Doe"}));

        let refs = extract_references(&condition, &registry()).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_scalar_in_list_field_is_malformed() {
        let observation = Resource::new(ResourceType::Observation)
            .with_field("hasMember", json!({"reference": "Observation/o-2"}));

        let err = extract_references(&observation, &registry()).unwrap_err();
        assert!(matches!(err, TransferError::MalformedReference { .. }));
    }

    #[test]
    fn test_unregistered_type_yields_nothing() {
        let custom = Resource::new(ResourceType::Custom("MolecularSequence".into()))
            .with_field("patient", json!({"reference": "Patient/p-1"}));

        let refs = extract_references(&custom, &registry()).unwrap();
        assert!(refs.is_empty());
    }
}
