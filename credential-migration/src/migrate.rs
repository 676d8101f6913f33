//! Bulk migration over a project repository.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::repository::ProjectRepository;
use crate::transform::transform_git_credentials;

/// Outcome of [`migrate_all`], by project name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Projects rewritten in the structured format
    pub migrated: Vec<String>,
    /// Projects without legacy credentials, left untouched
    pub skipped: Vec<String>,
    /// Projects whose write-back failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.migrated.len() + self.skipped.len() + self.failed.len()
    }
}

/// Migrate every project in `repository` with legacy git credentials.
///
/// A failed write-back is recorded in the report and the remaining projects
/// are still processed. Running the migration again is a no-op for projects
/// already migrated.
///
/// # Errors
///
/// Returns an error only if the projects cannot be listed.
pub async fn migrate_all<R>(repository: &R) -> Result<MigrationReport>
where
    R: ProjectRepository + ?Sized,
{
    let projects = repository.legacy_projects().await?;
    let mut report = MigrationReport::default();

    for legacy in projects {
        let name = legacy.project_name.clone();

        let Some(project) = transform_git_credentials(&legacy) else {
            debug!(project = %name, "No legacy git credentials");
            report.skipped.push(name);
            continue;
        };

        match repository.update_project(project).await {
            Ok(()) => {
                debug!(project = %name, "Migrated git credentials");
                report.migrated.push(name);
            }
            Err(e) => {
                warn!(project = %name, error = %e, "Could not migrate git credentials");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    info!(
        migrated = report.migrated.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Credential migration finished"
    );

    Ok(report)
}
