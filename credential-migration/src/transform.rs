//! Conversion of legacy flat git fields into structured credentials.

use crate::model::{GitCredentials, HttpsGitAuth, LegacyProject, Project, ProxyGitAuth};

/// Convert a legacy project into the structured credential format.
///
/// Returns `None` when the project has no git remote, which covers both
/// projects without credentials and projects already migrated. Otherwise:
///
/// - `ssh://` remotes get only URL and user
/// - any other remote gets an HTTPS block with `insecure_skip_tls`
/// - the HTTPS block gets a proxy only when a proxy URL is set, and the
///   proxy user only when it is non-empty
pub fn transform_git_credentials(project: &LegacyProject) -> Option<Project> {
    if project.git_remote_uri.is_empty() {
        return None;
    }

    let mut credentials = GitCredentials {
        remote_url: project.git_remote_uri.clone(),
        user: project.git_user.clone(),
        https: None,
    };

    if !credentials.is_ssh() {
        let proxy = (!project.git_proxy_url.is_empty()).then(|| ProxyGitAuth {
            scheme: project.git_proxy_scheme.clone(),
            url: project.git_proxy_url.clone(),
            user: project.git_proxy_user.clone(),
        });

        credentials.https = Some(HttpsGitAuth {
            insecure_skip_tls: project.insecure_skip_tls,
            proxy,
        });
    }

    Some(Project {
        creation_date: project.creation_date.clone(),
        git_credentials: Some(credentials),
        last_event_context: project.last_event_context.clone(),
        project_name: project.project_name.clone(),
        shipyard: project.shipyard.clone(),
        shipyard_version: project.shipyard_version.clone(),
        stages: project.stages.clone(),
    })
}
