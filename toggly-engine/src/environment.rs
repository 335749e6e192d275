//! Environment service.
//!
//! Every operation checks the enclosing project first.

use std::sync::Arc;

use chrono::Utc;
use toggly_core::{
    Environment, EnvironmentCode, EnvironmentInfo, ProjectScope, TogglyError, TogglyResult,
};
use toggly_storage::DataStorage;

use crate::project::ProjectService;
use crate::validation::require_code;
use crate::StorageResultExt;

pub struct EnvironmentService<S: ?Sized> {
    storage: Arc<S>,
    projects: ProjectService<S>,
}

impl<S: ?Sized> Clone for EnvironmentService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            projects: self.projects.clone(),
        }
    }
}

impl<S: DataStorage + ?Sized> EnvironmentService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            projects: ProjectService::new(Arc::clone(&storage)),
            storage,
        }
    }

    async fn project_exists(&self, scope: &ProjectScope) -> TogglyResult<()> {
        self.projects.get(&scope.owner, &scope.project).await.map(|_| ())
    }

    pub async fn list(&self, scope: &ProjectScope) -> TogglyResult<Vec<Environment>> {
        self.project_exists(scope).await?;
        self.storage
            .environment_list(scope)
            .await
            .during("environment_list")
    }

    pub async fn get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<Environment> {
        self.project_exists(scope).await?;
        self.storage
            .environment_get(scope, code)
            .await
            .during("environment_get")?
            .ok_or(TogglyError::EnvironmentNotFound)
    }

    pub async fn create(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment> {
        self.project_exists(scope).await?;
        require_code(&info.code, "Environment code not specified")?;
        let env = Environment {
            owner_id: scope.owner.clone(),
            project_code: scope.project.clone(),
            code: info.code,
            description: info.description,
            protected: info.protected,
            registered_at: Utc::now(),
        };
        self.storage
            .environment_save(&env)
            .await
            .during("environment_save")?;
        Ok(env)
    }

    /// Replace description and protection flag. Registration time is preserved.
    pub async fn update(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment> {
        self.project_exists(scope).await?;
        require_code(&info.code, "Environment code not specified")?;
        let existing = self.get(scope, &info.code).await?;
        let env = Environment {
            owner_id: scope.owner.clone(),
            project_code: scope.project.clone(),
            code: info.code,
            description: info.description,
            protected: info.protected,
            registered_at: existing.registered_at,
        };
        self.storage
            .environment_update(&env)
            .await
            .or_not_found("environment_update", TogglyError::EnvironmentNotFound)?;
        Ok(env)
    }

    /// Delete an environment that holds no objects.
    pub async fn delete(&self, scope: &ProjectScope, code: &EnvironmentCode) -> TogglyResult<()> {
        self.project_exists(scope).await?;
        let objects = self
            .storage
            .object_list(&scope.environment(code.clone()))
            .await
            .during("object_list")?;
        if !objects.is_empty() {
            return Err(TogglyError::EnvironmentNotEmpty);
        }
        self.storage
            .environment_delete(scope, code)
            .await
            .or_not_found("environment_delete", TogglyError::EnvironmentNotFound)
    }
}
