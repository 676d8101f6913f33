//! Process configuration read from the environment.

use std::time::Duration;

use api_client::EndpointConfig;
use event_source::{EventSourceConfig, RegistrationData};
use nats_connector::{NatsConfig, DEFAULT_NATS_URL};

use crate::error::{ConnectorAppError, Result};
use crate::logging::LoggingMode;

/// Everything the connector binary needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Public control-plane API endpoint; empty inside the cluster
    pub api_endpoint: String,
    /// Token for the public API
    pub api_token: String,
    /// NATS server URL
    pub nats_url: String,
    /// Integration name; also the queue group shared by replicas
    pub integration_name: String,
    /// Subjects to subscribe to
    pub subjects: Vec<String>,
    /// Log output format
    pub log_mode: LoggingMode,
    /// Timeout for the initial NATS connection
    pub connect_timeout: Duration,
    /// Channel sizes around the event source
    pub event_source: EventSourceConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            api_token: String::new(),
            nats_url: DEFAULT_NATS_URL.to_string(),
            integration_name: String::new(),
            subjects: Vec::new(),
            log_mode: LoggingMode::default(),
            connect_timeout: Duration::from_secs(10),
            event_source: EventSourceConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Read the configuration from process environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `CP_API_ENDPOINT` | `api_endpoint` |
    /// | `CP_API_TOKEN` | `api_token` |
    /// | `NATS_URL` | `nats_url` |
    /// | `CP_INTEGRATION_NAME` | `integration_name` |
    /// | `CP_SUBJECTS` | `subjects` (comma separated) |
    /// | `CP_LOG_MODE` | `log_mode` |
    /// | `CP_CONNECT_TIMEOUT_SECS` | `connect_timeout` |
    /// | `CP_EVENT_BUFFER_SIZE` | `event_source.update_buffer_size` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("CP_API_ENDPOINT") {
            config.api_endpoint = endpoint;
        }
        if let Some(token) = lookup("CP_API_TOKEN") {
            config.api_token = token;
        }
        if let Some(url) = lookup("NATS_URL") {
            config.nats_url = url;
        }
        if let Some(name) = lookup("CP_INTEGRATION_NAME") {
            config.integration_name = name;
        }
        if let Some(subjects) = lookup("CP_SUBJECTS") {
            config.subjects = split_subjects(&subjects);
        }
        if let Some(mode) = lookup("CP_LOG_MODE") {
            config.log_mode = mode.parse()?;
        }
        if let Some(secs) = lookup("CP_CONNECT_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ConnectorAppError::Configuration(format!(
                    "Invalid CP_CONNECT_TIMEOUT_SECS '{secs}'"
                ))
            })?;
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = lookup("CP_EVENT_BUFFER_SIZE") {
            config.event_source.update_buffer_size = size.parse().map_err(|_| {
                ConnectorAppError::Configuration(format!("Invalid CP_EVENT_BUFFER_SIZE '{size}'"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.integration_name.trim().is_empty() {
            return Err(ConnectorAppError::Configuration(
                "Integration name must not be empty".to_string(),
            ));
        }

        if self.nats_url.is_empty() {
            return Err(ConnectorAppError::Configuration(
                "NATS URL must not be empty".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(ConnectorAppError::Configuration(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        self.event_source.validate()?;
        Ok(())
    }

    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(self.api_endpoint.clone(), self.api_token.clone())
    }

    pub fn nats(&self) -> NatsConfig {
        NatsConfig::new(self.nats_url.clone())
            .with_client_name(self.integration_name.clone())
            .with_connect_timeout(self.connect_timeout)
    }

    pub fn registration(&self) -> RegistrationData {
        RegistrationData::new(self.integration_name.clone(), self.subjects.clone())
    }
}

/// Split a comma separated subject list, dropping blank entries.
pub fn split_subjects(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_minimal_environment() {
        let config = EnvConfig::from_lookup(lookup(&[("CP_INTEGRATION_NAME", "webhook-service")]))
            .unwrap();

        assert_eq!(config.integration_name, "webhook-service");
        assert_eq!(config.nats_url, "nats://localhost:4222");
        assert!(config.subjects.is_empty());
        assert!(!config.endpoint().is_remote());
    }

    #[test]
    fn test_full_environment() {
        let config = EnvConfig::from_lookup(lookup(&[
            ("CP_API_ENDPOINT", "https://cp.example.com/api"),
            ("CP_API_TOKEN", "token"),
            ("NATS_URL", "nats://cp-nats:4222"),
            ("CP_INTEGRATION_NAME", "webhook-service"),
            ("CP_SUBJECTS", "cp.event.a.triggered, cp.event.b.triggered,,"),
            ("CP_LOG_MODE", "json"),
            ("CP_CONNECT_TIMEOUT_SECS", "3"),
            ("CP_EVENT_BUFFER_SIZE", "5"),
        ]))
        .unwrap();

        assert_eq!(config.subjects, vec!["cp.event.a.triggered", "cp.event.b.triggered"]);
        assert_eq!(config.log_mode, LoggingMode::Json);
        assert_eq!(config.event_source.update_buffer_size, 5);

        let nats = config.nats();
        assert_eq!(nats.url, "nats://cp-nats:4222");
        assert_eq!(nats.client_name.as_deref(), Some("webhook-service"));
        assert_eq!(nats.connect_timeout, Duration::from_secs(3));

        let registration = config.registration();
        assert_eq!(registration.queue_group().as_str(), "webhook-service");
        assert_eq!(registration.subjects.len(), 2);
    }

    #[test]
    fn test_missing_integration_name() {
        let result = EnvConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConnectorAppError::Configuration(_))));
    }

    #[test]
    fn test_invalid_numbers() {
        let result = EnvConfig::from_lookup(lookup(&[
            ("CP_INTEGRATION_NAME", "svc"),
            ("CP_EVENT_BUFFER_SIZE", "many"),
        ]));
        assert!(matches!(result, Err(ConnectorAppError::Configuration(_))));

        let result = EnvConfig::from_lookup(lookup(&[
            ("CP_INTEGRATION_NAME", "svc"),
            ("CP_EVENT_BUFFER_SIZE", "0"),
        ]));
        assert!(matches!(result, Err(ConnectorAppError::EventSource(_))));
    }

    #[test]
    fn test_invalid_log_mode() {
        let result = EnvConfig::from_lookup(lookup(&[
            ("CP_INTEGRATION_NAME", "svc"),
            ("CP_LOG_MODE", "loud"),
        ]));
        assert!(matches!(result, Err(ConnectorAppError::Logging(_))));
    }
}
