//! Control-plane services and their addresses.

use std::collections::BTreeMap;
use std::fmt;

/// A control-plane service reachable through the API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Service {
    ConfigurationService,
    ShipyardController,
    ApiService,
    SecretService,
    Datastore,
}

impl Service {
    /// All known services.
    pub const ALL: [Service; 5] = [
        Service::ConfigurationService,
        Service::ShipyardController,
        Service::ApiService,
        Service::SecretService,
        Service::Datastore,
    ];

    /// In-cluster `host:port` used when no override is configured.
    pub fn default_address(self) -> &'static str {
        match self {
            Service::ConfigurationService => "resource-service:8080",
            Service::ShipyardController => "shipyard-controller:8080",
            Service::ApiService => "api-service:8080",
            Service::SecretService => "secret-service:8080",
            Service::Datastore => "mongodb-datastore:8080",
        }
    }

    /// Path prefix of the service behind the public API gateway.
    pub fn remote_prefix(self) -> &'static str {
        match self {
            Service::ConfigurationService => "configuration-service",
            Service::ShipyardController => "controlPlane",
            Service::ApiService => "v1",
            Service::SecretService => "secrets",
            Service::Datastore => "mongodb-datastore",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::ConfigurationService => "configuration-service",
            Service::ShipyardController => "shipyard-controller",
            Service::ApiService => "api-service",
            Service::SecretService => "secret-service",
            Service::Datastore => "datastore",
        };
        f.write_str(name)
    }
}

/// In-cluster address of every service.
///
/// Starts from [`Service::default_address`] for each service; individual
/// entries can be overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMappings {
    addresses: BTreeMap<Service, String>,
}

impl Default for ServiceMappings {
    fn default() -> Self {
        Self {
            addresses: Service::ALL
                .iter()
                .map(|service| (*service, service.default_address().to_string()))
                .collect(),
        }
    }
}

impl ServiceMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the address of `service`.
    pub fn with_address(mut self, service: Service, address: impl Into<String>) -> Self {
        self.addresses.insert(service, address.into());
        self
    }

    /// The configured `host:port` for `service`.
    pub fn address(&self, service: Service) -> &str {
        self.addresses
            .get(&service)
            .map(String::as_str)
            .unwrap_or_else(|| service.default_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings_cover_all_services() {
        let mappings = ServiceMappings::default();
        for service in Service::ALL {
            assert_eq!(mappings.address(service), service.default_address());
        }
    }

    #[test]
    fn test_override_single_service() {
        let mappings = ServiceMappings::new().with_address(Service::SecretService, "localhost:9000");

        assert_eq!(mappings.address(Service::SecretService), "localhost:9000");
        assert_eq!(mappings.address(Service::ApiService), "api-service:8080");
    }
}
