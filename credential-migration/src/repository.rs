//! Project storage
//!
//! This module provides the storage seam for the migration:
//! - `ProjectRepository`: read every project in legacy shape, write one back
//!   in the structured shape
//! - `InMemoryProjectRepository`: document store keeping projects as JSON,
//!   so legacy and migrated documents live side by side the way they do in a
//!   real database

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{MigrationError, Result};
use crate::model::{LegacyProject, Project};

/// Storage for projects during the credential migration.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Every stored project, decoded with the legacy field layout.
    ///
    /// Projects that were already migrated decode with an empty git remote.
    async fn legacy_projects(&self) -> Result<Vec<LegacyProject>>;

    /// Replace the stored project with the same name.
    async fn update_project(&self, project: Project) -> Result<()>;
}

/// Project documents keyed by project name.
#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    documents: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a project in the legacy layout.
    pub async fn insert_legacy(&self, project: &LegacyProject) -> Result<()> {
        let document = encode(&project.project_name, project)?;
        self.documents
            .write()
            .await
            .insert(project.project_name.clone(), document);
        Ok(())
    }

    /// Store a raw document, e.g. one that does not decode.
    pub async fn insert_document(&self, name: impl Into<String>, document: Value) {
        self.documents.write().await.insert(name.into(), document);
    }

    /// Read a project in the structured layout.
    pub async fn project(&self, name: &str) -> Result<Project> {
        let documents = self.documents.read().await;
        let document = documents
            .get(name)
            .ok_or_else(|| MigrationError::NotFound(name.to_string()))?;

        serde_json::from_value(document.clone()).map_err(|e| MigrationError::Decode {
            project: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn encode<T: serde::Serialize>(name: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| MigrationError::Decode {
        project: name.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn legacy_projects(&self) -> Result<Vec<LegacyProject>> {
        let documents = self.documents.read().await;
        let mut projects = Vec::with_capacity(documents.len());

        for (name, document) in documents.iter() {
            match serde_json::from_value::<LegacyProject>(document.clone()) {
                Ok(project) => projects.push(project),
                Err(e) => warn!(project = %name, error = %e, "Skipping project that does not decode"),
            }
        }

        Ok(projects)
    }

    async fn update_project(&self, project: Project) -> Result<()> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(&project.project_name) {
            return Err(MigrationError::NotFound(project.project_name));
        }

        let document = encode(&project.project_name, &project)?;
        documents.insert(project.project_name, document);
        Ok(())
    }
}
