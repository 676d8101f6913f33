//! # event-source
//!
//! Queue-group event source for the control-plane connector.
//!
//! This crate sits between application logic and a publish/subscribe broker.
//! An [`EventSource`] keeps a deduplicated set of subjects subscribed under a
//! queue group derived from the consumer's registration, so replicas of the
//! same consumer share delivery. Delivered messages are decoded into
//! [`ControlPlaneEvent`]s and handed to the application as [`EventUpdate`]s over
//! a bounded channel. The subject set can be replaced at runtime, teardown is
//! tied to a cancellation token, and [`EventSender`] publishes back through the
//! same connection.
//!
//! The broker itself is reached only through the [`BrokerConnector`] trait.

mod config;
mod connector;
mod error;
mod event;
mod handler;
mod sender;
mod source;
mod subjects;
mod types;

pub use config::EventSourceConfig;
pub use connector::{BrokerConnector, MessageHandler, ProcessMessage};
pub use error::*;
pub use event::ControlPlaneEvent;
pub use sender::EventSender;
pub use source::EventSource;
pub use subjects::SubjectSet;
pub use types::*;

pub use tokio_util::sync::CancellationToken;
