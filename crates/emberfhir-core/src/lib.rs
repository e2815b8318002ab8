pub mod error;
pub mod fhir;
pub mod id;
pub mod reference;
pub mod resource;
pub mod schema;
pub mod time;

pub use error::{CoreError, Result};
pub use fhir::ResourceType;
pub use id::{IdError, generate_id, validate_id};
pub use reference::{InvalidReference, Reference, parse_reference};
pub use resource::{Resource, ResourceMeta};
pub use schema::{ReferenceFieldRegistry, ReferenceFieldSpec};
pub use time::{FhirDateTime, now_utc};
