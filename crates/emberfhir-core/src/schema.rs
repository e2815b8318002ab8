//! Reference-field schema registry.
//!
//! FHIR resources point at each other through well-known fields. The
//! registry records, per resource type, which fields hold references and
//! whether they are list-valued, so extraction is a plain table walk
//! instead of reflective JSON scanning.
//!
//! The registry is an explicit value passed into every operation that needs
//! it. Construct one with [`ReferenceFieldRegistry::default`] for the common
//! clinical types and [`register`] additional types as needed.
//!
//! [`register`]: ReferenceFieldRegistry::register

use indexmap::IndexMap;

use crate::fhir::ResourceType;

/// One reference-typed field on a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFieldSpec {
    pub name: String,
    pub is_list: bool,
}

impl ReferenceFieldSpec {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_list: false,
        }
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_list: true,
        }
    }
}

/// Table of reference-typed fields per resource type.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFieldRegistry {
    specs: IndexMap<ResourceType, Vec<ReferenceFieldSpec>>,
}

impl ReferenceFieldRegistry {
    /// An empty registry. Most callers want [`ReferenceFieldRegistry::common`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the directly reference-typed fields of the
    /// common clinical resource types (FHIR R4). Fields nested inside
    /// backbone elements are not walked.
    pub fn common() -> Self {
        use ReferenceFieldSpec as F;
        let mut registry = Self::new();
        registry.register(
            ResourceType::Patient,
            vec![
                F::list("generalPractitioner"),
                F::single("managingOrganization"),
            ],
        );
        registry.register(ResourceType::Practitioner, vec![]);
        registry.register(ResourceType::Organization, vec![F::single("partOf")]);
        registry.register(
            ResourceType::Encounter,
            vec![
                F::single("subject"),
                F::list("basedOn"),
                F::list("episodeOfCare"),
                F::single("serviceProvider"),
                F::single("partOf"),
            ],
        );
        registry.register(
            ResourceType::Observation,
            vec![
                F::list("basedOn"),
                F::list("partOf"),
                F::single("subject"),
                F::list("focus"),
                F::single("encounter"),
                F::list("performer"),
                F::single("specimen"),
                F::single("device"),
                F::list("hasMember"),
                F::list("derivedFrom"),
            ],
        );
        registry.register(
            ResourceType::Condition,
            vec![
                F::single("subject"),
                F::single("encounter"),
                F::single("recorder"),
                F::single("asserter"),
            ],
        );
        registry.register(
            ResourceType::DiagnosticReport,
            vec![
                F::list("basedOn"),
                F::single("subject"),
                F::single("encounter"),
                F::list("performer"),
                F::list("resultsInterpreter"),
                F::list("specimen"),
                F::list("result"),
            ],
        );
        registry.register(ResourceType::Medication, vec![F::single("manufacturer")]);
        registry.register(
            ResourceType::MedicationRequest,
            vec![
                F::single("medicationReference"),
                F::single("subject"),
                F::single("encounter"),
                F::single("requester"),
                F::single("performer"),
                F::single("recorder"),
                F::list("basedOn"),
                F::list("reasonReference"),
            ],
        );
        registry.register(
            ResourceType::Procedure,
            vec![
                F::list("basedOn"),
                F::list("partOf"),
                F::single("subject"),
                F::single("encounter"),
                F::single("recorder"),
                F::single("asserter"),
                F::single("location"),
                F::list("reasonReference"),
            ],
        );
        registry.register(
            ResourceType::Specimen,
            vec![
                F::single("subject"),
                F::list("parent"),
                F::list("request"),
            ],
        );
        registry.register(
            ResourceType::DocumentReference,
            vec![
                F::single("subject"),
                F::list("author"),
                F::single("authenticator"),
                F::single("custodian"),
            ],
        );
        registry.register(
            ResourceType::Immunization,
            vec![
                F::single("patient"),
                F::single("encounter"),
                F::single("location"),
                F::single("manufacturer"),
            ],
        );
        registry.register(
            ResourceType::AllergyIntolerance,
            vec![
                F::single("patient"),
                F::single("encounter"),
                F::single("recorder"),
                F::single("asserter"),
            ],
        );
        registry.register(
            ResourceType::CarePlan,
            vec![
                F::list("basedOn"),
                F::list("replaces"),
                F::list("partOf"),
                F::single("subject"),
                F::single("encounter"),
                F::single("author"),
                F::list("contributor"),
                F::list("careTeam"),
                F::list("addresses"),
            ],
        );
        registry
    }

    /// Registers (or replaces) the reference fields of a resource type.
    pub fn register(&mut self, resource_type: ResourceType, fields: Vec<ReferenceFieldSpec>) {
        self.specs.insert(resource_type, fields);
    }

    /// The reference-typed fields of `resource_type`. Unregistered types
    /// have no known reference fields; callers working with custom types
    /// must register them or their references will not be seen.
    pub fn reference_fields(&self, resource_type: &ResourceType) -> &[ReferenceFieldSpec] {
        self.specs
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the registry knows anything about `resource_type`.
    pub fn knows(&self, resource_type: &ResourceType) -> bool {
        self.specs.contains_key(resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_registry_covers_clinical_types() {
        let registry = ReferenceFieldRegistry::common();
        assert!(registry.knows(&ResourceType::Patient));
        assert!(registry.knows(&ResourceType::Condition));

        let condition_fields = registry.reference_fields(&ResourceType::Condition);
        assert!(
            condition_fields
                .iter()
                .any(|f| f.name == "subject" && !f.is_list)
        );
    }

    #[test]
    fn test_list_flags() {
        let registry = ReferenceFieldRegistry::common();
        let observation = registry.reference_fields(&ResourceType::Observation);
        let has_member = observation.iter().find(|f| f.name == "hasMember").unwrap();
        assert!(has_member.is_list);
        let subject = observation.iter().find(|f| f.name == "subject").unwrap();
        assert!(!subject.is_list);
    }

    #[test]
    fn test_unregistered_type_has_no_fields() {
        let registry = ReferenceFieldRegistry::common();
        let custom = ResourceType::Custom("MolecularSequence".to_string());
        assert!(!registry.knows(&custom));
        assert!(registry.reference_fields(&custom).is_empty());
    }

    #[test]
    fn test_register_custom_type() {
        let mut registry = ReferenceFieldRegistry::common();
        let custom = ResourceType::Custom("MolecularSequence".to_string());
        registry.register(
            custom.clone(),
            vec![
                ReferenceFieldSpec::single("patient"),
                ReferenceFieldSpec::list("pointer"),
            ],
        );
        assert_eq!(registry.reference_fields(&custom).len(), 2);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ReferenceFieldRegistry::common();
        registry.register(ResourceType::Patient, vec![]);
        assert!(registry.reference_fields(&ResourceType::Patient).is_empty());
        assert!(registry.knows(&ResourceType::Patient));
    }
}
