//! FHIR Bundle types, limited to what the client exchanges: transaction
//! and batch bundles out, transaction-response and searchset bundles in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BundleEntry {
    #[serde(rename = "fullUrl", skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<BundleEntryResponse>,
}

/// Request component of an entry (transaction/batch bundles).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleEntryRequest {
    pub method: String,
    pub url: String,
}

/// Response component of an entry (transaction-response bundles).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BundleEntryResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "lastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bundle {
    #[serde(rename = "resourceType", default = "bundle_type_name")]
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub link: Vec<BundleLink>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub entry: Vec<BundleEntry>,
}

fn bundle_type_name() -> String {
    "Bundle".to_string()
}

impl Bundle {
    pub fn transaction(entries: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: bundle_type_name(),
            bundle_type: "transaction".to_string(),
            total: None,
            link: Vec::new(),
            entry: entries,
        }
    }

    pub fn batch(entries: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: bundle_type_name(),
            bundle_type: "batch".to_string(),
            total: None,
            link: Vec::new(),
            entry: entries,
        }
    }
}
