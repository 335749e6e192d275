//! The service API surface shared by [`Engine`] and the caching decorator.

use std::sync::Arc;

use async_trait::async_trait;
use toggly_core::{
    Environment, EnvironmentCode, EnvironmentInfo, EnvironmentScope, Object, ObjectCode,
    ObjectInfo, OwnerId, Project, ProjectCode, ProjectInfo, ProjectScope, TogglyResult,
};
use toggly_storage::DataStorage;

use crate::environment::EnvironmentService;
use crate::object::ObjectService;
use crate::project::ProjectService;

/// Operations over the Projects → Environments → Objects hierarchy.
///
/// Objects are always returned resolved against their inheritance chain,
/// except by [`object_inheritors_flat_list`](Self::object_inheritors_flat_list)
/// which returns stored rows.
#[async_trait]
pub trait TogglyApi: Send + Sync {
    // ========================================================================
    // PROJECTS
    // ========================================================================

    async fn project_list(&self, owner: &OwnerId) -> TogglyResult<Vec<Project>>;

    async fn project_get(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<Project>;

    async fn project_create(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project>;

    async fn project_update(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project>;

    async fn project_delete(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<()>;

    // ========================================================================
    // ENVIRONMENTS
    // ========================================================================

    async fn environment_list(&self, scope: &ProjectScope) -> TogglyResult<Vec<Environment>>;

    async fn environment_get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<Environment>;

    async fn environment_create(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment>;

    async fn environment_update(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment>;

    async fn environment_delete(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<()>;

    // ========================================================================
    // OBJECTS
    // ========================================================================

    async fn object_list(&self, scope: &EnvironmentScope) -> TogglyResult<Vec<Object>>;

    async fn object_get(&self, scope: &EnvironmentScope, code: &ObjectCode)
        -> TogglyResult<Object>;

    async fn object_create(&self, scope: &EnvironmentScope, info: ObjectInfo)
        -> TogglyResult<Object>;

    async fn object_update(&self, scope: &EnvironmentScope, info: ObjectInfo)
        -> TogglyResult<Object>;

    async fn object_delete(&self, scope: &EnvironmentScope, code: &ObjectCode)
        -> TogglyResult<()>;

    /// Every object that inherits from this one, directly or transitively.
    async fn object_inheritors_flat_list(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<Vec<Object>>;
}

/// The uncached engine: the three services over one storage.
pub struct Engine<S: ?Sized> {
    projects: ProjectService<S>,
    environments: EnvironmentService<S>,
    objects: ObjectService<S>,
}

impl<S: ?Sized> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            projects: self.projects.clone(),
            environments: self.environments.clone(),
            objects: self.objects.clone(),
        }
    }
}

impl<S: DataStorage + ?Sized> Engine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            projects: ProjectService::new(Arc::clone(&storage)),
            environments: EnvironmentService::new(Arc::clone(&storage)),
            objects: ObjectService::new(storage),
        }
    }

    pub fn projects(&self) -> &ProjectService<S> {
        &self.projects
    }

    pub fn environments(&self) -> &EnvironmentService<S> {
        &self.environments
    }

    pub fn objects(&self) -> &ObjectService<S> {
        &self.objects
    }
}

#[async_trait]
impl<S: DataStorage + ?Sized + 'static> TogglyApi for Engine<S> {
    async fn project_list(&self, owner: &OwnerId) -> TogglyResult<Vec<Project>> {
        self.projects.list(owner).await
    }

    async fn project_get(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<Project> {
        self.projects.get(owner, code).await
    }

    async fn project_create(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project> {
        self.projects.create(owner, info).await
    }

    async fn project_update(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project> {
        self.projects.update(owner, info).await
    }

    async fn project_delete(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<()> {
        self.projects.delete(owner, code).await
    }

    async fn environment_list(&self, scope: &ProjectScope) -> TogglyResult<Vec<Environment>> {
        self.environments.list(scope).await
    }

    async fn environment_get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<Environment> {
        self.environments.get(scope, code).await
    }

    async fn environment_create(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment> {
        self.environments.create(scope, info).await
    }

    async fn environment_update(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment> {
        self.environments.update(scope, info).await
    }

    async fn environment_delete(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<()> {
        self.environments.delete(scope, code).await
    }

    async fn object_list(&self, scope: &EnvironmentScope) -> TogglyResult<Vec<Object>> {
        self.objects.list(scope).await
    }

    async fn object_get(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<Object> {
        self.objects.get(scope, code).await
    }

    async fn object_create(
        &self,
        scope: &EnvironmentScope,
        info: ObjectInfo,
    ) -> TogglyResult<Object> {
        self.objects.create(scope, info).await
    }

    async fn object_update(
        &self,
        scope: &EnvironmentScope,
        info: ObjectInfo,
    ) -> TogglyResult<Object> {
        self.objects.update(scope, info).await
    }

    async fn object_delete(&self, scope: &EnvironmentScope, code: &ObjectCode) -> TogglyResult<()> {
        self.objects.delete(scope, code).await
    }

    async fn object_inheritors_flat_list(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<Vec<Object>> {
        self.objects.inheritors_flat_list(scope, code).await
    }
}
