//! Choosing between the in-cluster and the remote client set.

use tracing::info;
use url::Url;

use crate::client::{default_agent, ApiSet, InternalApiSet, RemoteApiSet};
use crate::error::{ApiError, Result};
use crate::services::ServiceMappings;

/// Where and how to reach the control-plane API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Public API endpoint. Empty means "running inside the cluster".
    pub api_endpoint: String,
    /// Token sent with remote requests. Empty means no token.
    pub api_token: String,
}

impl EndpointConfig {
    pub fn new(api_endpoint: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            api_token: api_token.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        !self.api_endpoint.is_empty()
    }
}

/// Constructs the in-cluster client set.
pub type InternalFactory = fn(ureq::Agent, ServiceMappings) -> Result<InternalApiSet>;

/// Constructs the remote client set from the parsed endpoint and optional token.
pub type RemoteFactory = fn(ureq::Agent, Url, Option<String>) -> Result<RemoteApiSet>;

/// The two client constructors used by [`create_api`].
///
/// Swapping them lets the selection logic be exercised without building
/// real clients.
#[derive(Debug, Clone, Copy)]
pub struct Initializer {
    pub internal: InternalFactory,
    pub remote: RemoteFactory,
}

impl Default for Initializer {
    fn default() -> Self {
        Self {
            internal: |agent, mappings| Ok(InternalApiSet::new(agent, mappings)),
            remote: |agent, url, token| Ok(RemoteApiSet::new(agent, url, token)),
        }
    }
}

/// Pick and build the client set for `config`.
///
/// An empty endpoint selects the in-cluster set with default service
/// mappings. Any other endpoint must be an `http` or `https` URL and selects
/// the remote set.
///
/// # Errors
///
/// * `ApiError::InvalidEndpoint` - The endpoint is not a valid URL
/// * `ApiError::UnsupportedScheme` - The endpoint is not http(s)
/// * Whatever the chosen constructor returns
pub fn create_api(
    agent: Option<ureq::Agent>,
    config: &EndpointConfig,
    initializer: &Initializer,
) -> Result<ApiSet> {
    let agent = agent.unwrap_or_else(default_agent);

    if !config.is_remote() {
        info!("No API endpoint configured, using in-cluster services");
        let set = (initializer.internal)(agent, ServiceMappings::default())?;
        return Ok(ApiSet::Internal(set));
    }

    let endpoint = parse_endpoint(&config.api_endpoint)?;
    info!(endpoint = %endpoint, "Using remote control-plane API");

    let token = Some(config.api_token.clone()).filter(|token| !token.is_empty());
    let set = (initializer.remote)(agent, endpoint, token)?;
    Ok(ApiSet::Remote(set))
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|e| ApiError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::UnsupportedScheme(other.to_string())),
    }
}
