//! Object service: the inheritance engine.
//!
//! Reads return objects resolved against their ancestor chain. Writes guard
//! the chain in both directions: a new parameter must agree in type with the
//! parent's declaration, and an edit must not change a type or shadow a
//! parameter an inheritor already declares.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use toggly_core::{
    EnvironmentScope, Object, ObjectCode, ObjectInfo, ObjectRef, OwnerId, Parameter,
    TogglyError, TogglyResult,
};
use toggly_storage::DataStorage;

use crate::environment::EnvironmentService;
use crate::resolve::{fetch_ref, find_cycle, resolve_object};
use crate::validation::{require_code, validate_parameters};
use crate::StorageResultExt;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub struct ObjectService<S: ?Sized> {
    storage: Arc<S>,
    environments: EnvironmentService<S>,
}

impl<S: ?Sized> Clone for ObjectService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            environments: self.environments.clone(),
        }
    }
}

impl<S: DataStorage + ?Sized> ObjectService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            environments: EnvironmentService::new(Arc::clone(&storage)),
            storage,
        }
    }

    async fn env_exists(&self, scope: &EnvironmentScope) -> TogglyResult<()> {
        self.environments
            .get(&scope.project_scope(), &scope.environment)
            .await
            .map(|_| ())
    }

    async fn stored(&self, scope: &EnvironmentScope, code: &ObjectCode) -> TogglyResult<Object> {
        self.storage
            .object_get(scope, code)
            .await
            .during("object_get")?
            .ok_or(TogglyError::ObjectNotFound)
    }

    /// Every object of the environment, each resolved independently.
    pub async fn list(&self, scope: &EnvironmentScope) -> TogglyResult<Vec<Object>> {
        self.env_exists(scope).await?;
        let stored = self.storage.object_list(scope).await.during("object_list")?;
        let mut resolved = Vec::with_capacity(stored.len());
        for object in stored {
            resolved.push(resolve_object(self.storage.as_ref(), object).await?);
        }
        Ok(resolved)
    }

    pub async fn get(&self, scope: &EnvironmentScope, code: &ObjectCode) -> TogglyResult<Object> {
        self.env_exists(scope).await?;
        let object = self.stored(scope, code).await?;
        resolve_object(self.storage.as_ref(), object).await
    }

    pub async fn create(&self, scope: &EnvironmentScope, info: ObjectInfo) -> TogglyResult<Object> {
        self.env_exists(scope).await?;
        require_code(&info.code, "Object code not specified")?;
        let parameters = validate_parameters(&info.parameters)?;

        let parent = self.check_inheritance(&scope.owner, info.inherits.as_ref()).await?;
        check_parent_types(parent.as_ref(), &parameters)?;

        let object = Object {
            owner: scope.owner.clone(),
            project_code: scope.project.clone(),
            env_code: scope.environment.clone(),
            code: info.code,
            description: info.description,
            inherits: info.inherits,
            parameters,
        };
        self.storage.object_save(&object).await.during("object_save")?;
        self.get(scope, &object.code).await
    }

    pub async fn update(&self, scope: &EnvironmentScope, info: ObjectInfo) -> TogglyResult<Object> {
        self.env_exists(scope).await?;
        require_code(&info.code, "Object code not specified")?;
        let parameters = validate_parameters(&info.parameters)?;

        // Own declarations drive the guard; resolving surfaces a broken chain.
        let existing = self.stored(scope, &info.code).await?;
        resolve_object(self.storage.as_ref(), existing.clone()).await?;
        self.check_parameter_changes(&existing, &parameters).await?;

        let parent = self.check_inheritance(&scope.owner, info.inherits.as_ref()).await?;
        check_parent_types(parent.as_ref(), &parameters)?;
        if let Some(target) = &info.inherits {
            let origin = existing.object_ref();
            let cycle = find_cycle(self.storage.as_ref(), &scope.owner, &origin, target).await?;
            if let Some(path) = cycle {
                return Err(TogglyError::InheritanceCycle { path });
            }
        }

        let object = Object {
            owner: scope.owner.clone(),
            project_code: scope.project.clone(),
            env_code: scope.environment.clone(),
            code: info.code,
            description: info.description,
            inherits: info.inherits,
            parameters,
        };
        self.storage
            .object_update(&object)
            .await
            .or_not_found("object_update", TogglyError::ObjectNotFound)?;
        self.get(scope, &object.code).await
    }

    /// Delete an object nothing inherits from.
    pub async fn delete(&self, scope: &EnvironmentScope, code: &ObjectCode) -> TogglyResult<()> {
        self.env_exists(scope).await?;
        let inheritors = self
            .storage
            .object_list_inheritors(&scope.owner, &scope.object_ref(code.clone()))
            .await
            .during("object_list_inheritors")?;
        if !inheritors.is_empty() {
            return Err(TogglyError::ObjectHasInheritors);
        }
        self.storage
            .object_delete(scope, code)
            .await
            .or_not_found("object_delete", TogglyError::ObjectNotFound)
    }

    /// Transitive inheritors as stored: direct inheritors first, then each
    /// one's own flat list in turn. An object is listed at most once.
    pub async fn inheritors_flat_list(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<Vec<Object>> {
        self.env_exists(scope).await?;
        let root = scope.object_ref(code.clone());
        let mut visited = HashSet::from([root.clone()]);
        self.collect_inheritors(&scope.owner, root, &mut visited).await
    }

    fn collect_inheritors<'a, 'v>(
        &'a self,
        owner: &'a OwnerId,
        parent: ObjectRef,
        visited: &'v mut HashSet<ObjectRef>,
    ) -> BoxFuture<'v, TogglyResult<Vec<Object>>>
    where
        'a: 'v,
    {
        Box::pin(async move {
            let direct: Vec<Object> = self
                .storage
                .object_list_inheritors(owner, &parent)
                .await
                .during("object_list_inheritors")?
                .into_iter()
                .filter(|o| visited.insert(o.object_ref()))
                .collect();

            let mut list = direct.clone();
            for inheritor in &direct {
                let sub = self
                    .collect_inheritors(owner, inheritor.object_ref(), &mut *visited)
                    .await?;
                list.extend(sub);
            }
            Ok(list)
        })
    }

    /// Resolve the stored parent an object points at. Any missing link is
    /// reported as [`TogglyError::ObjectParentNotExists`].
    async fn check_inheritance(
        &self,
        owner: &OwnerId,
        inherits: Option<&ObjectRef>,
    ) -> TogglyResult<Option<Object>> {
        let Some(target) = inherits else {
            return Ok(None);
        };
        match fetch_ref(self.storage.as_ref(), owner, target).await {
            Ok(parent) => Ok(Some(parent)),
            Err(
                TogglyError::ProjectNotFound
                | TogglyError::EnvironmentNotFound
                | TogglyError::ObjectNotFound,
            ) => Err(TogglyError::ObjectParentNotExists),
            Err(other) => Err(other),
        }
    }

    /// Reject type changes on the object's own parameters, and new
    /// parameters some transitive inheritor already declares.
    async fn check_parameter_changes(
        &self,
        existing: &Object,
        parameters: &[Parameter],
    ) -> TogglyResult<()> {
        let inheritors = self
            .inheritors_flat_list(&existing.scope(), &existing.code)
            .await?;

        for p in parameters {
            match existing.parameter(p.code.as_str()) {
                Some(current) if current.param_type() != p.param_type() => {
                    return Err(TogglyError::object_parameter(
                        p.code.as_str(),
                        "Object parameter type changing restricted",
                    ));
                }
                Some(_) => {}
                None => {
                    let shadowed = inheritors
                        .iter()
                        .find(|inh| inh.parameter(p.code.as_str()).is_some());
                    if let Some(inh) = shadowed {
                        return Err(TogglyError::object_parameter(
                            p.code.as_str(),
                            format!(
                                "Object parameter exists in inheritor: {}:{}:{}",
                                inh.project_code, inh.env_code, inh.code
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Shallow type guard: only the parent's own declarations are compared.
fn check_parent_types(parent: Option<&Object>, parameters: &[Parameter]) -> TogglyResult<()> {
    let Some(parent) = parent else {
        return Ok(());
    };
    let mismatch = parameters.iter().any(|p| {
        parent
            .parameter(p.code.as_str())
            .is_some_and(|pp| pp.param_type() != p.param_type())
    });
    if mismatch {
        return Err(TogglyError::ObjectInheritorTypeMismatch);
    }
    Ok(())
}
