//! The FHIR server handle.
//!
//! One [`FhirServer`] wraps one server's base URL, credentials, and HTTP
//! client. It offers single-resource and bulk CRUD, single-page search,
//! and the two integrity-preserving entry points: [`transfer`] to move a
//! resource set to another server, and [`delete_all`] to delete a set in
//! reverse dependency order.
//!
//! Retries, backoff, and pagination are deliberately absent: the handle
//! performs exactly one HTTP exchange per call and surfaces any failure.
//!
//! [`transfer`]: FhirServer::transfer
//! [`delete_all`]: FhirServer::delete_all

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use emberfhir_core::{Reference, ReferenceFieldRegistry, Resource};
use emberfhir_transfer::{
    CreateResult, DeleteBatches, TransferOptions, TransferSource, TransferTarget,
    transfer_resources,
};

use crate::bundle::Bundle;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::query::SearchParams;
use crate::response::{TransferReport, create_results, operation_outcome_message, parse_location};
use crate::transactions::{TransactionMethod, reference_bundle, transaction_bundle};

const FHIR_JSON: &str = "application/fhir+json";

pub struct FhirServer {
    http: reqwest::Client,
    config: ClientConfig,
}

impl FhirServer {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { http, config })
    }

    /// Builds a handle from `FHIR_API_URL` and the auth environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn api_address(&self) -> &str {
        &self.config.api_address
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.config.api_address.clone()
        } else {
            format!("{}/{path}", self.config.api_address)
        }
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.config
            .auth
            .apply(self.http.request(method, url))
            .header("Accept", FHIR_JSON)
    }

    /// Sends the request and returns `(body, location-header)`, mapping
    /// non-success statuses to [`ClientError::Http`] with any
    /// OperationOutcome diagnostics the server included.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<(String, Option<String>)> {
        let response = request.send().await?;
        let status = response.status();
        let location = response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let message = operation_outcome_message(&body).unwrap_or(body);
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok((body, location))
    }

    async fn execute_json(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let (body, _) = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// The server's CapabilityStatement.
    pub async fn capabilities(&self) -> Result<Value> {
        self.execute_json(self.request(Method::GET, &self.url("metadata")))
            .await
    }

    /// Reads one resource.
    pub async fn get(&self, reference: &Reference) -> Result<Resource> {
        let value = self
            .execute_json(self.request(Method::GET, &self.url(&reference.to_relative())))
            .await?;
        Ok(Resource::from_json(value)?)
    }

    /// Reads many resources with one batch request.
    pub async fn get_many(&self, references: &[Reference]) -> Result<Vec<Resource>> {
        if references.is_empty() {
            return Ok(Vec::new());
        }
        let bundle = reference_bundle(TransactionMethod::Get, references)?;
        let response = self.submit_bundle(&bundle).await?;
        response
            .entry
            .into_iter()
            .filter_map(|entry| entry.resource)
            .map(|value| Resource::from_json(value).map_err(ClientError::from))
            .collect()
    }

    /// Creates one resource; the server assigns the id.
    pub async fn create(&self, resource: Resource) -> Result<CreateResult> {
        let url = self.url(resource.resource_type.as_str());
        let mut body = resource.clone();
        body.id = None;
        let request = self
            .request(Method::POST, &url)
            .header("Content-Type", FHIR_JSON)
            .json(&body.to_json()?);

        let (_, location) = self.execute(request).await?;
        let location = location.ok_or_else(|| {
            ClientError::response_shape("create response carries no Location header")
        })?;
        let reference = parse_location(&location)?;
        let mut created = resource;
        created.id = Some(reference.id.clone());
        Ok(CreateResult {
            reference,
            resource: created,
        })
    }

    /// Creates a batch of resources with one transaction per
    /// `batch_size`-sized chunk, preserving submission order across
    /// chunks. Returns one [`CreateResult`] per input, in input order.
    pub async fn create_all(&self, resources: Vec<Resource>) -> Result<Vec<CreateResult>> {
        if resources.is_empty() {
            return Ok(Vec::new());
        }
        let mut results = Vec::with_capacity(resources.len());
        for chunk in resources.chunks(self.config.batch_size.max(1)) {
            let bundle = transaction_bundle(TransactionMethod::Post, chunk)?;
            debug!(resources = chunk.len(), server = %self.config.api_address, "submitting create transaction");
            let response = self.submit_bundle(&bundle).await?;
            results.extend(create_results(response, chunk.to_vec())?);
        }
        Ok(results)
    }

    /// Updates existing resources (PUT transaction); every resource must
    /// carry its server-assigned id.
    pub async fn update(&self, resources: &[Resource]) -> Result<()> {
        if resources.is_empty() {
            return Ok(());
        }
        let bundle = transaction_bundle(TransactionMethod::Put, resources)?;
        self.submit_bundle(&bundle).await?;
        Ok(())
    }

    /// Deletes the referenced resources with one transaction. No ordering
    /// logic here; use [`delete_all`] for sets with interdependencies.
    ///
    /// [`delete_all`]: FhirServer::delete_all
    pub async fn delete(&self, references: &[Reference]) -> Result<()> {
        if references.is_empty() {
            return Ok(());
        }
        let bundle = reference_bundle(TransactionMethod::Delete, references)?;
        self.submit_bundle(&bundle).await?;
        Ok(())
    }

    /// Runs a single-page search.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Resource>> {
        let request = self
            .request(Method::GET, &self.url(&params.resource_type.to_string()))
            .query(&params.to_query_pairs());
        let value = self.execute_json(request).await?;
        let bundle: Bundle = serde_json::from_value(value)?;
        bundle
            .entry
            .into_iter()
            .filter_map(|entry| entry.resource)
            .map(|value| Resource::from_json(value).map_err(ClientError::from))
            .collect()
    }

    /// Transfers `resources` from this server to `target`, preserving
    /// referential integrity.
    ///
    /// Missing referenced resources are fetched from this server when
    /// `options.auto_fetch_missing` is set; the rest is the transfer
    /// engine's layered drain. Resources created on `target` before a
    /// failure stay there.
    pub async fn transfer(
        &self,
        target: &FhirServer,
        resources: Vec<Resource>,
        registry: &ReferenceFieldRegistry,
        options: &TransferOptions,
    ) -> Result<TransferReport> {
        info!(
            origin = %self.config.api_address,
            destination = %target.config.api_address,
            resources = resources.len(),
            "starting transfer"
        );
        let outcome = transfer_resources(resources, self, target, registry, options).await?;
        Ok(TransferReport {
            origin: self.config.api_address.clone(),
            destination: target.config.api_address.clone(),
            created: outcome.created,
            linkage: outcome.linkage,
        })
    }

    /// Queries this server and transfers the result set to `target`.
    pub async fn transfer_query(
        &self,
        target: &FhirServer,
        params: &SearchParams,
        registry: &ReferenceFieldRegistry,
        options: &TransferOptions,
    ) -> Result<TransferReport> {
        let resources = self.search(params).await?;
        self.transfer(target, resources, registry, options).await
    }

    /// Plans deletion of a query's result set in reverse dependency
    /// order. For an in-memory resource set, use [`DeleteBatches::new`]
    /// directly.
    pub async fn resolve_deletes_query(
        &self,
        params: &SearchParams,
        registry: &ReferenceFieldRegistry,
    ) -> Result<DeleteBatches> {
        let resources = self.search(params).await?;
        Ok(DeleteBatches::new(resources, registry)?)
    }

    /// Deletes `resources` batch by batch, dependents before their
    /// dependencies. Stops at the first failing batch; earlier batches
    /// stay deleted.
    pub async fn delete_all(
        &self,
        resources: Vec<Resource>,
        registry: &ReferenceFieldRegistry,
    ) -> Result<Vec<Reference>> {
        let batches = DeleteBatches::new(resources, registry)?;
        let mut deleted = Vec::new();
        for batch in batches {
            let batch = batch?;
            let references = batch
                .iter()
                .map(Resource::reference)
                .collect::<emberfhir_core::Result<Vec<_>>>()?;
            debug!(resources = references.len(), "deleting batch");
            self.delete(&references).await?;
            deleted.extend(references);
        }
        Ok(deleted)
    }

    async fn submit_bundle(&self, bundle: &Bundle) -> Result<Bundle> {
        let request = self
            .request(Method::POST, &self.url(""))
            .header("Content-Type", FHIR_JSON)
            .json(bundle);
        let value = self.execute_json(request).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl TransferTarget for FhirServer {
    async fn bulk_create(
        &self,
        resources: Vec<Resource>,
    ) -> emberfhir_transfer::Result<Vec<CreateResult>> {
        FhirServer::create_all(self, resources).await.map_err(Into::into)
    }
}

#[async_trait]
impl TransferSource for FhirServer {
    async fn get_many(
        &self,
        references: &[Reference],
    ) -> emberfhir_transfer::Result<Vec<Resource>> {
        FhirServer::get_many(self, references).await.map_err(Into::into)
    }
}
