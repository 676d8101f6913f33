//! # cp-connector
//!
//! Runs an integration against the control plane over NATS.
//!
//! ## Overview
//!
//! The connector wires three pieces together:
//!
//! - an [`EventSource`](event_source::EventSource) that keeps the integration's
//!   subjects subscribed under its queue group
//! - a [`SubscriptionSource`] that decides which subjects those are, and may
//!   change them at runtime
//! - an [`EventHandler`] with the integration's business logic
//!
//! [`ControlPlane::run`] starts the event source and drives all three until
//! the cancellation token fires.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cp_connector::{ControlPlane, StaticSubscriptionSource};
//!
//! let connector = NatsConnector::connect(config.nats()).await?;
//! let control_plane = ControlPlane::new(
//!     EventSource::new(Arc::new(connector)),
//!     Arc::new(StaticSubscriptionSource::new(config.subjects.clone())),
//!     Arc::new(MyIntegration),
//! );
//!
//! control_plane.run(cancel, config.registration()).await?;
//! ```
//!
//! ## Configuration
//!
//! [`EnvConfig::from_env`] reads the process environment; see its docs for
//! the variables. Logging is set up through [`logging`].

pub mod config;
pub mod control_plane;
pub mod error;
pub mod logging;

pub use config::EnvConfig;
pub use control_plane::{
    ControlPlane, EventHandler, HandlerError, StaticSubscriptionSource, SubscriptionSource,
};
pub use error::{ConnectorAppError, Result};
pub use logging::{init_logging, LoggingMode};
