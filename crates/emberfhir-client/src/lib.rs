//! HTTP client for FHIR servers.
//!
//! Wraps a server's REST API behind [`FhirServer`]: CRUD, bulk
//! transactions, single-page search, and the referential-integrity
//! entry points built on the `emberfhir-transfer` engine.
//!
//! ```no_run
//! # async fn example() -> Result<(), emberfhir_client::ClientError> {
//! use emberfhir_client::{ClientConfig, FhirServer};
//! use emberfhir_core::ReferenceFieldRegistry;
//! use emberfhir_transfer::TransferOptions;
//!
//! let origin = FhirServer::new(ClientConfig::new("https://origin.example.org/fhir")?)?;
//! let destination = FhirServer::new(
//!     ClientConfig::new("https://destination.example.org/fhir")?.with_token("s3cret"),
//! )?;
//!
//! let registry = ReferenceFieldRegistry::common();
//! let patients = origin
//!     .search(&emberfhir_client::SearchParams::new(emberfhir_core::ResourceType::Patient))
//!     .await?;
//! let report = origin
//!     .transfer(&destination, patients, &registry, &TransferOptions::default())
//!     .await?;
//! println!("moved {} resources", report.created.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod bundle;
pub mod config;
pub mod error;
pub mod query;
pub mod response;
pub mod server;
pub mod transactions;

pub use auth::AuthMethod;
pub use bundle::{Bundle, BundleEntry, BundleEntryRequest, BundleEntryResponse, BundleLink};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use query::{FieldParam, IncludeParam, SearchOperator, SearchParams};
pub use response::{TransferReport, operation_outcome_message, parse_location};
pub use server::FhirServer;
pub use transactions::{TransactionMethod, reference_bundle, transaction_bundle};
