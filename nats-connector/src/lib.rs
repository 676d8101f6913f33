//! NATS broker connector for the cp-connector event source.
//!
//! This crate implements [`event_source::BrokerConnector`] on top of
//! `async-nats`. It owns the connection and the per-subject subscriptions;
//! everything above it (deduplication, queue group naming, subscription
//! swapping) lives in the event-source crate.
//!
//! # Overview
//!
//! - [`NatsConnector`]: connection plus subscription registry. Every subject
//!   is served by its own delivery task that hands messages to the installed
//!   handler.
//! - [`NatsConfig`]: server URL, client name and connect timeout.
//! - [`NatsError`]: adapter errors, converted into
//!   [`ConnectorError`](event_source::ConnectorError) at the trait boundary.
//!
//! Events are published as JSON on the subject named by their type.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use event_source::EventSource;
//! use nats_connector::{NatsConfig, NatsConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nats_connector::NatsError> {
//!     let config = NatsConfig::new("nats://localhost:4222").with_client_name("webhook-service");
//!     let connector = NatsConnector::connect(config).await?;
//!     let source = EventSource::new(Arc::new(connector));
//!     # let _ = source;
//!     Ok(())
//! }
//! ```

mod config;
mod connector;
mod error;
mod registry;

pub use config::{NatsConfig, DEFAULT_NATS_URL};
pub use connector::NatsConnector;
pub use error::{NatsError, Result};
