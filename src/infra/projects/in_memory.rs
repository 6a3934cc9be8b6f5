// In-memory implementation of ProjectStore.
//
// Used when no data directory is wanted (and by the console tests). Nothing survives a
// restart.

use crate::core::projects::{Project, ProjectError, ProjectStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

pub struct InMemoryProjectStore {
    /// Maps project id -> project
    projects: DashMap<String, Project>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self {
            projects: DashMap::new(),
        }
    }
}

impl Default for InMemoryProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn insert(&self, project: Project) -> Result<(), ProjectError> {
        match self.projects.entry(project.id.clone()) {
            Entry::Occupied(_) => Err(ProjectError::StorageError(format!(
                "duplicate project id {}",
                project.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(project);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Project>, ProjectError> {
        Ok(self.projects.get(id).map(|entry| entry.clone()))
    }

    async fn list(&self) -> Result<Vec<Project>, ProjectError> {
        let mut all: Vec<Project> = self.projects.iter().map(|entry| entry.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn set_auth_key(&self, id: &str, key: &str) -> Result<bool, ProjectError> {
        match self.projects.get_mut(id) {
            Some(mut entry) => {
                entry.auth_key = Some(key.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, ProjectError> {
        Ok(self.projects.remove(id).is_some())
    }
}
