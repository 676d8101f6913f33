//! Error types for the credential migration

/// Errors raised while reading or writing projects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The backing store failed
    #[error("Project repository error: {0}")]
    Repository(String),

    /// A stored project could not be decoded or encoded
    #[error("Could not decode project {project}: {reason}")]
    Decode { project: String, reason: String },

    /// No project with this name exists
    #[error("Project {0} not found")]
    NotFound(String),
}

/// Convenience type alias for Results using MigrationError.
pub type Result<T> = std::result::Result<T, MigrationError>;
