use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::fhir::ResourceType;
use crate::id::generate_id;
use crate::reference::Reference;
use crate::time::FhirDateTime;

/// Server-maintained metadata. Only the fields the client reads back are
/// modeled; everything else rides along in the envelope's field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourceMeta {
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<FhirDateTime>,
    #[serde(rename = "versionId", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub profile: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    // security, tag, and anything server-specific survive round-trips here
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A typed envelope over a FHIR resource's JSON representation.
///
/// The envelope models exactly what the client needs to know about any
/// resource: its type tag, its (optional) server-assigned id, metadata,
/// and an ordered field map. Field contents stay opaque `serde_json::Value`s.
///
/// A resource that has not been created on a server yet has no id; it is
/// identified by a client-generated surrogate instead, which [`local_key`]
/// folds into a stable node key. The surrogate never serializes.
///
/// [`local_key`]: Resource::local_key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "resourceType")]
    pub resource_type: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResourceMeta>,
    #[serde(flatten)]
    fields: IndexMap<String, Value>,
    #[serde(skip, default = "generate_id")]
    surrogate: String,
}

impl Resource {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            id: None,
            meta: None,
            fields: IndexMap::new(),
            surrogate: generate_id(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Builds an envelope from raw FHIR JSON, failing loudly when the
    /// `resourceType` tag is absent or not a plausible type name.
    pub fn from_json(value: Value) -> Result<Self> {
        let type_name = value
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or(CoreError::MissingResourceType)?;
        ResourceType::from_str(type_name)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Stable node identity: `Type/id` once the server assigned an id,
    /// otherwise `Type/urn:uuid:<surrogate>`.
    pub fn local_key(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{}", self.resource_type, id),
            None => format!("{}/urn:uuid:{}", self.resource_type, self.surrogate),
        }
    }

    /// The relative path `Type/id`, available only for server-known resources.
    pub fn relative_path(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(|id| format!("{}/{}", self.resource_type, id))
    }

    /// A reference to this resource; errors if no id has been assigned yet.
    pub fn reference(&self) -> Result<Reference> {
        match &self.id {
            Some(id) => Ok(Reference::new(self.resource_type.as_str(), id.clone())),
            None => Err(CoreError::missing_resource_id(self.resource_type.as_str())),
        }
    }
}

// Surrogates are per-instance scaffolding, not resource state.
impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.resource_type == other.resource_type
            && self.id == other.id
            && self.meta == other.meta
            && self.fields == other.fields
    }
}

impl Eq for Resource {}
