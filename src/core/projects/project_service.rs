// Project service - creating, listing and keying projects on the dashboard.
//
// Persistence goes through the `ProjectStore` port; the infra layer provides an
// in-memory store and a SQLite one.

use super::project_models::Project;
use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;

const PROJECT_ID_PREFIX: &str = "prj-";
const PROJECT_ID_SUFFIX_LEN: usize = 12;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Invalid project: {0}")]
    Invalid(String),

    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert(&self, project: Project) -> Result<(), ProjectError>;

    async fn get(&self, id: &str) -> Result<Option<Project>, ProjectError>;

    /// All projects, oldest first.
    async fn list(&self) -> Result<Vec<Project>, ProjectError>;

    /// Returns false when no project has this id.
    async fn set_auth_key(&self, id: &str, key: &str) -> Result<bool, ProjectError>;

    /// Returns false when no project has this id.
    async fn delete(&self, id: &str) -> Result<bool, ProjectError>;
}

#[async_trait]
impl ProjectStore for Box<dyn ProjectStore> {
    async fn insert(&self, project: Project) -> Result<(), ProjectError> {
        (**self).insert(project).await
    }

    async fn get(&self, id: &str) -> Result<Option<Project>, ProjectError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Project>, ProjectError> {
        (**self).list().await
    }

    async fn set_auth_key(&self, id: &str, key: &str) -> Result<bool, ProjectError> {
        (**self).set_auth_key(id, key).await
    }

    async fn delete(&self, id: &str) -> Result<bool, ProjectError> {
        (**self).delete(id).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ProjectService<S: ProjectStore> {
    store: S,
}

impl<S: ProjectStore> ProjectService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn generate_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(PROJECT_ID_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("{}{}", PROJECT_ID_PREFIX, suffix)
    }

    /// Create a project. Name and description must both be non-blank.
    pub async fn create(&self, name: &str, description: &str) -> Result<Project, ProjectError> {
        let name = name.trim();
        let description = description.trim();
        if name.is_empty() {
            return Err(ProjectError::Invalid("name is required".to_string()));
        }
        if description.is_empty() {
            return Err(ProjectError::Invalid("description is required".to_string()));
        }

        let project = Project {
            id: Self::generate_id(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
            auth_key: None,
        };
        self.store.insert(project.clone()).await?;

        tracing::info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    pub async fn list(&self) -> Result<Vec<Project>, ProjectError> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Project, ProjectError> {
        self.store
            .get(id.trim())
            .await?
            .ok_or_else(|| ProjectError::NotFound(id.trim().to_string()))
    }

    /// Remember the key the remote service issued for a project.
    pub async fn attach_key(&self, id: &str, key: &str) -> Result<Project, ProjectError> {
        if key.trim().is_empty() {
            return Err(ProjectError::Invalid("key is required".to_string()));
        }
        if !self.store.set_auth_key(id, key.trim()).await? {
            return Err(ProjectError::NotFound(id.to_string()));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ProjectError> {
        if self.store.delete(id.trim()).await? {
            Ok(())
        } else {
            Err(ProjectError::NotFound(id.trim().to_string()))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
