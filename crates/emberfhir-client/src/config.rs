//! Client configuration.
//!
//! A [`ClientConfig`] is built programmatically, deserialized from a
//! config file, or read from the environment (`FHIR_API_URL` plus the
//! auth variables).

use serde::{Deserialize, Serialize};

use crate::auth::AuthMethod;
use crate::error::{ClientError, Result};

const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the FHIR API, without a trailing slash.
    pub api_address: String,
    #[serde(default)]
    pub auth: AuthMethod,
    /// Upper bound on resources per bulk submission.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(api_address: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            api_address: validate_api_address(api_address.as_ref())?,
            auth: AuthMethod::None,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    /// Reads `FHIR_API_URL` and the auth variables.
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("FHIR_API_URL")
            .map_err(|_| ClientError::configuration("FHIR_API_URL is not set"))?;
        let mut config = Self::new(address)?;
        config.auth = AuthMethod::from_env()?;
        Ok(config)
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::basic(username, password);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::bearer(token);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Re-checks a configuration that did not come through [`new`], e.g.
    /// one deserialized from a file.
    ///
    /// [`new`]: ClientConfig::new
    pub fn validate(&self) -> Result<()> {
        validate_api_address(&self.api_address)?;
        if self.batch_size == 0 {
            return Err(ClientError::configuration("batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// Checks that the address is an absolute http(s) URL and normalizes away
/// the trailing slash.
fn validate_api_address(address: &str) -> Result<String> {
    let parsed = url::Url::parse(address.trim())?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClientError::configuration(format!(
                "unsupported scheme '{other}' in API address {address}"
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(ClientError::configuration(format!(
            "API address {address} has no host"
        )));
    }
    Ok(address.trim().trim_end_matches('/').to_string())
}
