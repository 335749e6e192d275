//! In-memory storage adapter.
//!
//! Rows are kept in insertion order per entity kind, which gives `*_list`
//! the same ordering a document store returns for a natural scan.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use toggly_core::{
    EntityKind, Environment, EnvironmentCode, EnvironmentScope, Object, ObjectCode, ObjectRef,
    OwnerId, Project, ProjectCode, ProjectScope, StorageError,
};

use crate::{DataStorage, StorageResult};

/// In-memory storage for tests and single-process deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    projects: Arc<RwLock<Vec<Project>>>,
    environments: Arc<RwLock<Vec<Environment>>>,
    objects: Arc<RwLock<Vec<Object>>>,
}

fn read<T>(lock: &RwLock<T>) -> StorageResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> StorageResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::LockPoisoned)
}

fn project_key(owner: &OwnerId, code: &ProjectCode) -> String {
    format!("owner:{}, code:{}", owner, code)
}

fn environment_key(scope: &ProjectScope, code: &EnvironmentCode) -> String {
    format!("owner:{}, project:{}, code:{}", scope.owner, scope.project, code)
}

fn object_key(scope: &EnvironmentScope, code: &ObjectCode) -> String {
    format!(
        "owner:{}, project:{}, env:{}, code:{}",
        scope.owner, scope.project, scope.environment, code
    )
}

impl InMemoryStorage {
    /// Create a new, empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all owners.
    pub fn object_count(&self) -> StorageResult<usize> {
        Ok(read(&self.objects)?.len())
    }
}

#[async_trait]
impl DataStorage for InMemoryStorage {
    // === Project Operations ===

    async fn project_list(&self, owner: &OwnerId) -> StorageResult<Vec<Project>> {
        let projects = read(&self.projects)?;
        Ok(projects
            .iter()
            .filter(|p| &p.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn project_get(
        &self,
        owner: &OwnerId,
        code: &ProjectCode,
    ) -> StorageResult<Option<Project>> {
        let projects = read(&self.projects)?;
        Ok(projects
            .iter()
            .find(|p| &p.owner_id == owner && &p.code == code)
            .cloned())
    }

    async fn project_save(&self, project: &Project) -> StorageResult<()> {
        let mut projects = write(&self.projects)?;
        if projects
            .iter()
            .any(|p| p.owner_id == project.owner_id && p.code == project.code)
        {
            return Err(StorageError::UniqueIndex {
                entity: EntityKind::Project,
                key: project_key(&project.owner_id, &project.code),
            });
        }
        projects.push(project.clone());
        Ok(())
    }

    async fn project_update(&self, project: &Project) -> StorageResult<()> {
        let mut projects = write(&self.projects)?;
        let slot = projects
            .iter_mut()
            .find(|p| p.owner_id == project.owner_id && p.code == project.code)
            .ok_or_else(|| StorageError::NotFound {
                entity: EntityKind::Project,
                key: project_key(&project.owner_id, &project.code),
            })?;
        *slot = project.clone();
        Ok(())
    }

    async fn project_delete(&self, owner: &OwnerId, code: &ProjectCode) -> StorageResult<()> {
        let mut projects = write(&self.projects)?;
        let before = projects.len();
        projects.retain(|p| !(&p.owner_id == owner && &p.code == code));
        if projects.len() == before {
            return Err(StorageError::NotFound {
                entity: EntityKind::Project,
                key: project_key(owner, code),
            });
        }
        Ok(())
    }

    // === Environment Operations ===

    async fn environment_list(&self, scope: &ProjectScope) -> StorageResult<Vec<Environment>> {
        let environments = read(&self.environments)?;
        Ok(environments
            .iter()
            .filter(|e| e.owner_id == scope.owner && e.project_code == scope.project)
            .cloned()
            .collect())
    }

    async fn environment_get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> StorageResult<Option<Environment>> {
        let environments = read(&self.environments)?;
        Ok(environments
            .iter()
            .find(|e| {
                e.owner_id == scope.owner && e.project_code == scope.project && &e.code == code
            })
            .cloned())
    }

    async fn environment_save(&self, env: &Environment) -> StorageResult<()> {
        let mut environments = write(&self.environments)?;
        let scope = ProjectScope::new(env.owner_id.clone(), env.project_code.clone());
        if environments.iter().any(|e| {
            e.owner_id == env.owner_id && e.project_code == env.project_code && e.code == env.code
        }) {
            return Err(StorageError::UniqueIndex {
                entity: EntityKind::Environment,
                key: environment_key(&scope, &env.code),
            });
        }
        environments.push(env.clone());
        Ok(())
    }

    async fn environment_update(&self, env: &Environment) -> StorageResult<()> {
        let mut environments = write(&self.environments)?;
        let slot = environments
            .iter_mut()
            .find(|e| {
                e.owner_id == env.owner_id
                    && e.project_code == env.project_code
                    && e.code == env.code
            })
            .ok_or_else(|| StorageError::NotFound {
                entity: EntityKind::Environment,
                key: environment_key(
                    &ProjectScope::new(env.owner_id.clone(), env.project_code.clone()),
                    &env.code,
                ),
            })?;
        *slot = env.clone();
        Ok(())
    }

    async fn environment_delete(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> StorageResult<()> {
        let mut environments = write(&self.environments)?;
        let before = environments.len();
        environments.retain(|e| {
            !(e.owner_id == scope.owner && e.project_code == scope.project && &e.code == code)
        });
        if environments.len() == before {
            return Err(StorageError::NotFound {
                entity: EntityKind::Environment,
                key: environment_key(scope, code),
            });
        }
        Ok(())
    }

    // === Object Operations ===

    async fn object_list(&self, scope: &EnvironmentScope) -> StorageResult<Vec<Object>> {
        let objects = read(&self.objects)?;
        Ok(objects
            .iter()
            .filter(|o| &o.scope() == scope)
            .cloned()
            .collect())
    }

    async fn object_get(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> StorageResult<Option<Object>> {
        let objects = read(&self.objects)?;
        Ok(objects
            .iter()
            .find(|o| &o.code == code && &o.scope() == scope)
            .cloned())
    }

    async fn object_save(&self, object: &Object) -> StorageResult<()> {
        let mut objects = write(&self.objects)?;
        let scope = object.scope();
        if objects
            .iter()
            .any(|o| o.code == object.code && o.scope() == scope)
        {
            return Err(StorageError::UniqueIndex {
                entity: EntityKind::Object,
                key: object_key(&scope, &object.code),
            });
        }
        objects.push(object.clone());
        Ok(())
    }

    async fn object_update(&self, object: &Object) -> StorageResult<()> {
        let mut objects = write(&self.objects)?;
        let scope = object.scope();
        let slot = objects
            .iter_mut()
            .find(|o| o.code == object.code && o.scope() == scope)
            .ok_or_else(|| StorageError::NotFound {
                entity: EntityKind::Object,
                key: object_key(&scope, &object.code),
            })?;
        *slot = object.clone();
        Ok(())
    }

    async fn object_delete(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> StorageResult<()> {
        let mut objects = write(&self.objects)?;
        let before = objects.len();
        objects.retain(|o| !(&o.code == code && &o.scope() == scope));
        if objects.len() == before {
            return Err(StorageError::NotFound {
                entity: EntityKind::Object,
                key: object_key(scope, code),
            });
        }
        Ok(())
    }

    async fn object_list_inheritors(
        &self,
        owner: &OwnerId,
        parent: &ObjectRef,
    ) -> StorageResult<Vec<Object>> {
        let objects = read(&self.objects)?;
        Ok(objects
            .iter()
            .filter(|o| &o.owner == owner && o.inherits.as_ref() == Some(parent))
            .cloned()
            .collect())
    }
}
