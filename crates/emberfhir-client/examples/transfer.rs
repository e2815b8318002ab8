//! Moves every patient on the origin server, together with everything
//! they reference, to the target server.
//!
//! ```sh
//! ORIGIN_FHIR_URL=http://localhost:8080/fhir \
//! TARGET_FHIR_URL=http://localhost:8081/fhir \
//! cargo run --example transfer
//! ```

use anyhow::Result;
use emberfhir_client::{ClientConfig, FhirServer, SearchParams};
use emberfhir_core::{ReferenceFieldRegistry, ResourceType};
use emberfhir_transfer::TransferOptions;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let origin = FhirServer::new(ClientConfig::new(std::env::var("ORIGIN_FHIR_URL")?)?)?;
    let target = FhirServer::new(ClientConfig::new(std::env::var("TARGET_FHIR_URL")?)?)?;

    let registry = ReferenceFieldRegistry::common();
    let report = origin
        .transfer_query(
            &target,
            &SearchParams::new(ResourceType::Patient),
            &registry,
            &TransferOptions::default(),
        )
        .await?;

    println!(
        "created {} resources on {}",
        report.created.len(),
        report.destination
    );
    for (origin_key, destination) in &report.linkage {
        println!("  {origin_key} -> {destination}");
    }
    Ok(())
}
