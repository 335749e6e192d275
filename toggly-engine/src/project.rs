//! Project service.

use std::sync::Arc;

use chrono::Utc;
use toggly_core::{OwnerId, Project, ProjectCode, ProjectInfo, TogglyError, TogglyResult};
use toggly_storage::DataStorage;

use crate::validation::require_code;
use crate::StorageResultExt;

/// CRUD over an owner's projects.
pub struct ProjectService<S: ?Sized> {
    storage: Arc<S>,
}

impl<S: ?Sized> Clone for ProjectService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: DataStorage + ?Sized> ProjectService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn list(&self, owner: &OwnerId) -> TogglyResult<Vec<Project>> {
        self.storage.project_list(owner).await.during("project_list")
    }

    pub async fn get(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<Project> {
        self.storage
            .project_get(owner, code)
            .await
            .during("project_get")?
            .ok_or(TogglyError::ProjectNotFound)
    }

    pub async fn create(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project> {
        require_code(&info.code, "Project code not specified")?;
        let project = Project {
            owner_id: owner.clone(),
            code: info.code,
            description: info.description,
            registered_at: Utc::now(),
            status: info.status,
        };
        self.storage
            .project_save(&project)
            .await
            .during("project_save")?;
        Ok(project)
    }

    /// Replace description and status. Registration time is preserved.
    pub async fn update(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project> {
        require_code(&info.code, "Project code not specified")?;
        let existing = self.get(owner, &info.code).await?;
        let project = Project {
            owner_id: owner.clone(),
            code: info.code,
            description: info.description,
            registered_at: existing.registered_at,
            status: info.status,
        };
        self.storage
            .project_update(&project)
            .await
            .or_not_found("project_update", TogglyError::ProjectNotFound)?;
        Ok(project)
    }

    /// Delete a project that has no environments.
    pub async fn delete(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<()> {
        let environments = self
            .storage
            .environment_list(&owner.project(code.clone()))
            .await
            .during("environment_list")?;
        if !environments.is_empty() {
            return Err(TogglyError::ProjectNotEmpty);
        }
        self.storage
            .project_delete(owner, code)
            .await
            .or_not_found("project_delete", TogglyError::ProjectNotFound)
    }
}
