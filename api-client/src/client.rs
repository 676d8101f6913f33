//! In-cluster and remote API client sets.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Result};
use crate::services::{Service, ServiceMappings};

/// Header carrying the API token on remote requests.
pub const AUTH_HEADER: &str = "x-token";

/// Build the HTTP agent used when the caller does not supply one.
pub fn default_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(Duration::from_secs(10))
        .build()
}

/// Clients talking to control-plane services directly inside the cluster.
#[derive(Debug, Clone)]
pub struct InternalApiSet {
    agent: ureq::Agent,
    mappings: ServiceMappings,
}

impl InternalApiSet {
    pub fn new(agent: ureq::Agent, mappings: ServiceMappings) -> Self {
        Self { agent, mappings }
    }

    pub fn mappings(&self) -> &ServiceMappings {
        &self.mappings
    }

    /// Full URL of `path` on `service`.
    pub fn url_for(&self, service: Service, path: &str) -> String {
        format!(
            "http://{}/{}",
            self.mappings.address(service),
            path.trim_start_matches('/')
        )
    }
}

/// Clients talking to the control plane through its public API endpoint.
#[derive(Debug, Clone)]
pub struct RemoteApiSet {
    agent: ureq::Agent,
    base_url: Url,
    token: Option<String>,
}

impl RemoteApiSet {
    pub fn new(agent: ureq::Agent, base_url: Url, token: Option<String>) -> Self {
        Self {
            agent,
            base_url,
            token,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Full URL of `path` on `service`, routed through the API gateway.
    pub fn url_for(&self, service: Service, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            service.remote_prefix(),
            path.trim_start_matches('/')
        )
    }
}

/// The client set chosen for this process.
#[derive(Debug, Clone)]
pub enum ApiSet {
    Internal(InternalApiSet),
    Remote(RemoteApiSet),
}

impl ApiSet {
    pub fn is_internal(&self) -> bool {
        matches!(self, ApiSet::Internal(_))
    }

    pub fn url_for(&self, service: Service, path: &str) -> String {
        match self {
            ApiSet::Internal(set) => set.url_for(service, path),
            ApiSet::Remote(set) => set.url_for(service, path),
        }
    }

    /// GET `path` on `service` and decode the JSON body.
    ///
    /// Remote requests carry the API token in the `x-token` header.
    pub fn get_json<T: DeserializeOwned>(&self, service: Service, path: &str) -> Result<T> {
        let url = self.url_for(service, path);
        debug!(service = %service, url = %url, "Calling control-plane API");

        let request = match self {
            ApiSet::Internal(set) => set.agent.get(&url),
            ApiSet::Remote(set) => match &set.token {
                Some(token) => set.agent.get(&url).set(AUTH_HEADER, token),
                None => set.agent.get(&url),
            },
        };

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => ApiError::Status {
                url: url.clone(),
                status,
            },
            other => ApiError::Network(other.to_string()),
        })?;

        response
            .into_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
