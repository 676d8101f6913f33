//! Control-plane API client selection
//!
//! A connector either runs inside the cluster next to the control-plane
//! services or outside it, talking to the public API endpoint. This crate
//! decides which from an [`EndpointConfig`] and builds the matching client
//! set:
//!
//! - empty endpoint: [`InternalApiSet`] addressing each [`Service`] directly
//!   via [`ServiceMappings`]
//! - `http`/`https` endpoint: [`RemoteApiSet`] routing through the gateway,
//!   with the token in the `x-token` header
//!
//! Anything else is rejected.

mod client;
mod error;
mod initializer;
mod services;

pub use client::{default_agent, ApiSet, InternalApiSet, RemoteApiSet, AUTH_HEADER};
pub use error::{ApiError, Result};
pub use initializer::{create_api, EndpointConfig, Initializer, InternalFactory, RemoteFactory};
pub use services::{Service, ServiceMappings};
