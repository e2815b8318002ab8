//! Transaction and batch bundle assembly.
//!
//! FHIR bulk operations go over the wire as a Bundle whose entries each
//! carry an HTTP request. The rules per method:
//! - `POST` submits the resource body with any client-side id stripped;
//!   the server assigns the identity.
//! - `PUT` requires an id and addresses `Type/id`.
//! - `DELETE` and `GET` are URL-only entries addressing `Type/id`.

use std::fmt;

use crate::bundle::{Bundle, BundleEntry, BundleEntryRequest};
use crate::error::{ClientError, Result};
use emberfhir_core::{Reference, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl TransactionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for TransactionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds a transaction bundle from resource bodies (`POST`/`PUT`/`DELETE`).
pub fn transaction_bundle(method: TransactionMethod, resources: &[Resource]) -> Result<Bundle> {
    if method == TransactionMethod::Get {
        return Err(ClientError::configuration(
            "GET transactions take references, not resources",
        ));
    }
    let entries = resources
        .iter()
        .map(|resource| resource_entry(method, resource))
        .collect::<Result<Vec<_>>>()?;
    Ok(Bundle::transaction(entries))
}

/// Builds a bundle of URL-only entries: a `batch` for `GET` (reads are
/// independent), a `transaction` for `DELETE` (a delete batch must apply
/// atomically or not at all).
pub fn reference_bundle(method: TransactionMethod, references: &[Reference]) -> Result<Bundle> {
    match method {
        TransactionMethod::Get | TransactionMethod::Delete => {}
        other => {
            return Err(ClientError::configuration(format!(
                "{other} transactions need resource bodies, not references"
            )));
        }
    }
    let entries = references
        .iter()
        .map(|reference| BundleEntry {
            request: Some(BundleEntryRequest {
                method: method.as_str().to_string(),
                url: reference.to_relative(),
            }),
            ..BundleEntry::default()
        })
        .collect();
    Ok(match method {
        TransactionMethod::Delete => Bundle::transaction(entries),
        _ => Bundle::batch(entries),
    })
}

fn resource_entry(method: TransactionMethod, resource: &Resource) -> Result<BundleEntry> {
    let url = match method {
        TransactionMethod::Post => resource.resource_type.to_string(),
        TransactionMethod::Put | TransactionMethod::Delete => {
            resource.relative_path().ok_or_else(|| {
                ClientError::configuration(format!(
                    "{method} requires a resource with an id, got {}",
                    resource.local_key()
                ))
            })?
        }
        TransactionMethod::Get => unreachable!("rejected above"),
    };

    let body = match method {
        TransactionMethod::Delete => None,
        TransactionMethod::Post => {
            // the target server assigns the id
            let mut stripped = resource.clone();
            stripped.id = None;
            Some(stripped.to_json()?)
        }
        _ => Some(resource.to_json()?),
    };

    Ok(BundleEntry {
        resource: body,
        request: Some(BundleEntryRequest {
            method: method.as_str().to_string(),
            url,
        }),
        ..BundleEntry::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberfhir_core::ResourceType;
    use serde_json::json;

    fn patient(id: &str) -> Resource {
        Resource::new(ResourceType::Patient)
            .with_id(id)
            .with_field("active", json!(true))
    }

    #[test]
    fn test_post_strips_id_and_targets_type() {
        let bundle = transaction_bundle(TransactionMethod::Post, &[patient("p-1")]).unwrap();
        assert_eq!(bundle.bundle_type, "transaction");

        let entry = &bundle.entry[0];
        let request = entry.request.as_ref().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "Patient");
        let body = entry.resource.as_ref().unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["active"], json!(true));
    }

    #[test]
    fn test_put_requires_id() {
        let bundle = transaction_bundle(TransactionMethod::Put, &[patient("p-1")]).unwrap();
        let request = bundle.entry[0].request.as_ref().unwrap();
        assert_eq!(request.url, "Patient/p-1");
        assert_eq!(
            bundle.entry[0].resource.as_ref().unwrap()["id"],
            json!("p-1")
        );

        let no_id = Resource::new(ResourceType::Patient);
        assert!(transaction_bundle(TransactionMethod::Put, &[no_id]).is_err());
    }

    #[test]
    fn test_delete_entries_are_url_only() {
        let bundle = transaction_bundle(TransactionMethod::Delete, &[patient("p-1")]).unwrap();
        let entry = &bundle.entry[0];
        assert!(entry.resource.is_none());
        assert_eq!(entry.request.as_ref().unwrap().url, "Patient/p-1");
    }

    #[test]
    fn test_reference_bundle_get() {
        let refs = [
            Reference::new("Patient", "1"),
            Reference::new("Condition", "2"),
        ];
        let bundle = reference_bundle(TransactionMethod::Get, &refs).unwrap();
        assert_eq!(bundle.bundle_type, "batch");
        assert_eq!(bundle.entry.len(), 2);
        assert_eq!(bundle.entry[1].request.as_ref().unwrap().url, "Condition/2");
    }

    #[test]
    fn test_reference_bundle_delete_is_atomic() {
        let refs = [Reference::new("Condition", "c-1")];
        let bundle = reference_bundle(TransactionMethod::Delete, &refs).unwrap();
        assert_eq!(bundle.bundle_type, "transaction");
        assert!(bundle.entry[0].resource.is_none());
    }

    #[test]
    fn test_method_mismatches_rejected() {
        assert!(transaction_bundle(TransactionMethod::Get, &[patient("p")]).is_err());
        assert!(reference_bundle(TransactionMethod::Post, &[Reference::new("Patient", "1")]).is_err());
        assert!(reference_bundle(TransactionMethod::Put, &[Reference::new("Patient", "1")]).is_err());
    }
}
