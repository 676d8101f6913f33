//! Project documents in the legacy and the structured credential format.

use serde::{Deserialize, Serialize};

/// Context of the last event processed for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContextInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keptn_context: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub time: String,
}

/// A stage of a project. Carried through the migration untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedStage {
    #[serde(default)]
    pub stage_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_stages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<serde_json::Value>,
}

/// A project stored with flat git fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
    #[serde(rename = "gitRemoteURI", default, skip_serializing_if = "String::is_empty")]
    pub git_remote_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_context: Option<EventContextInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipyard: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipyard_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_proxy_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_proxy_scheme: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_proxy_user: String,
    #[serde(rename = "insecureSkipTLS", default)]
    pub insecure_skip_tls: bool,
    #[serde(default)]
    pub stages: Vec<ExpandedStage>,
}

/// Proxy used to reach an HTTPS git remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyGitAuth {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheme: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
}

/// HTTPS-specific git settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsGitAuth {
    #[serde(rename = "insecureSkipTLS", default)]
    pub insecure_skip_tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyGitAuth>,
}

/// Structured git credentials of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCredentials {
    #[serde(rename = "remoteURL", default)]
    pub remote_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<HttpsGitAuth>,
}

impl GitCredentials {
    pub fn is_ssh(&self) -> bool {
        self.remote_url.starts_with("ssh://")
    }
}

/// A project in the structured credential format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_credentials: Option<GitCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_context: Option<EventContextInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipyard: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipyard_version: String,
    #[serde(default)]
    pub stages: Vec<ExpandedStage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_project_wire_names() {
        let project: LegacyProject = serde_json::from_str(
            r#"{
                "projectName": "sockshop",
                "gitRemoteURI": "https://github.com/org/sockshop",
                "gitUser": "user",
                "gitProxyUrl": "proxy:3128",
                "gitProxyScheme": "http",
                "insecureSkipTLS": true,
                "stages": [{"stageName": "dev"}]
            }"#,
        )
        .unwrap();

        assert_eq!(project.project_name, "sockshop");
        assert_eq!(project.git_remote_uri, "https://github.com/org/sockshop");
        assert_eq!(project.git_proxy_url, "proxy:3128");
        assert!(project.insecure_skip_tls);
        assert_eq!(project.stages[0].stage_name, "dev");
    }

    #[test]
    fn test_migrated_project_has_no_legacy_remote() {
        let project = Project {
            project_name: "sockshop".to_string(),
            git_credentials: Some(GitCredentials {
                remote_url: "ssh://git@github.com/org/sockshop".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let json = serde_json::to_value(&project).unwrap();
        let legacy: LegacyProject = serde_json::from_value(json).unwrap();

        assert_eq!(legacy.project_name, "sockshop");
        assert!(legacy.git_remote_uri.is_empty());
    }
}
