//! Auth header construction.
//!
//! Servers either take basic credentials or a static bearer token; both
//! can come from the environment (`FHIR_USER`/`FHIR_PW`, `FHIR_TOKEN`).

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
}

impl AuthMethod {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Reads credentials from `FHIR_USER`/`FHIR_PW`/`FHIR_TOKEN`. No
    /// variables set means no auth; conflicting or partial credentials are
    /// configuration errors.
    pub fn from_env() -> Result<Self> {
        let username = std::env::var("FHIR_USER").ok();
        let password = std::env::var("FHIR_PW").ok();
        let token = std::env::var("FHIR_TOKEN").ok();

        match (username, password, token) {
            (Some(_), _, Some(_)) => Err(ClientError::configuration(
                "conflicting auth information: both FHIR_USER and FHIR_TOKEN are set",
            )),
            (Some(username), Some(password), None) => Ok(Self::Basic { username, password }),
            (Some(_), None, None) => Err(ClientError::configuration(
                "FHIR_USER is set but FHIR_PW is not",
            )),
            (None, _, Some(token)) => Ok(Self::Bearer { token }),
            (None, _, None) => Ok(Self::None),
        }
    }

    /// Attaches the credentials to an outgoing request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::None => request,
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
            Self::Bearer { token } => request.bearer_auth(token),
        }
    }
}
