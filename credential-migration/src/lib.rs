//! Git Credential Migration
//!
//! Projects used to store git settings as flat fields (`gitRemoteURI`,
//! `gitUser`, `gitProxyUrl`, ...). The structured format groups them under
//! `gitCredentials`, with an HTTPS block only for non-SSH remotes and a proxy
//! block only when a proxy is configured.
//!
//! # Quick Start
//!
//! ```rust
//! use credential_migration::{transform_git_credentials, LegacyProject};
//!
//! let legacy = LegacyProject {
//!     project_name: "sockshop".to_string(),
//!     git_remote_uri: "https://github.com/org/sockshop".to_string(),
//!     insecure_skip_tls: true,
//!     ..Default::default()
//! };
//!
//! let project = transform_git_credentials(&legacy).unwrap();
//! let https = project.git_credentials.unwrap().https.unwrap();
//! assert!(https.insecure_skip_tls);
//! assert!(https.proxy.is_none());
//! ```
//!
//! [`migrate_all`] applies the transform to every project of a
//! [`ProjectRepository`] and is safe to run repeatedly.

mod error;
mod migrate;
mod model;
mod repository;
mod transform;

pub use error::{MigrationError, Result};
pub use migrate::{migrate_all, MigrationReport};
pub use model::{
    EventContextInfo, ExpandedStage, GitCredentials, HttpsGitAuth, LegacyProject, Project,
    ProxyGitAuth,
};
pub use repository::{InMemoryProjectRepository, ProjectRepository};
pub use transform::transform_git_credentials;
