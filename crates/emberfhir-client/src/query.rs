//! Search query construction.
//!
//! Mechanical assembly of FHIR search parameters into query pairs.
//! Pagination is the transport collaborator's concern; this module only
//! shapes a single request.

use std::fmt;

use emberfhir_core::ResourceType;

/// FHIR search prefixes. `Eq` is the implicit default and carries no
/// prefix on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOperator {
    #[default]
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl SearchOperator {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Eq => "",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParam {
    pub name: String,
    pub operator: SearchOperator,
    pub value: String,
}

/// `_include=Type:field`, pulling referenced resources into the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeParam {
    pub resource_type: ResourceType,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub resource_type: ResourceType,
    pub fields: Vec<FieldParam>,
    pub includes: Vec<IncludeParam>,
    pub count: Option<u32>,
}

impl SearchParams {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            fields: Vec::new(),
            includes: Vec::new(),
            count: None,
        }
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        operator: SearchOperator,
        value: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldParam {
            name: name.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn with_include(mut self, field: impl Into<String>) -> Self {
        self.includes.push(IncludeParam {
            resource_type: self.resource_type.clone(),
            field: field.into(),
        });
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Key/value pairs ready for query-string serialization.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for field in &self.fields {
            pairs.push((
                field.name.clone(),
                format!("{}{}", field.operator.prefix(), field.value),
            ));
        }
        for include in &self.includes {
            pairs.push((
                "_include".to_string(),
                format!("{}:{}", include.resource_type, include.field),
            ));
        }
        if let Some(count) = self.count {
            pairs.push(("_count".to_string(), count.to_string()));
        }
        pairs
    }

    /// The URL-encoded form `Type?params`.
    pub fn to_query_string(&self) -> String {
        let pairs = self.to_query_pairs();
        if pairs.is_empty() {
            return self.resource_type.to_string();
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        format!("{}?{}", self.resource_type, encoded)
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_string())
    }
}
