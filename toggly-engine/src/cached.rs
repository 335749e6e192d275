//! Read-through caching decorator.
//!
//! [`CachedApi`] wraps any [`TogglyApi`] behind the same surface. Reads of
//! lists and single entities are served from the cache when present and
//! stored on a miss; successful writes flush every key whose response they
//! can change. Because an object's resolved view depends on its ancestors,
//! an object update also flushes the entries of all its transitive
//! inheritors. Deleting a project or environment also drops the cached
//! child list of the deleted scope.
//!
//! Concurrent misses for the same key may each compute and store the value;
//! reads are side-effect free so the last store wins harmlessly.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use toggly_core::{
    CacheError, Environment, EnvironmentCode, EnvironmentInfo, EnvironmentScope, Object,
    ObjectCode, ObjectInfo, OwnerId, Project, ProjectCode, ProjectInfo, ProjectScope,
    TogglyError, TogglyResult,
};
use toggly_storage::{CacheBackend, CacheKey, CacheRead};
use tracing::{debug, error, warn};

use crate::api::TogglyApi;

/// Caching decorator over a [`TogglyApi`].
///
/// Without a backend every call passes straight through and reads report
/// [`ReadSource::Origin`](toggly_storage::ReadSource::Origin).
pub struct CachedApi<A, C: ?Sized> {
    inner: A,
    cache: Option<Arc<C>>,
}

impl<A: Clone, C: ?Sized> Clone for CachedApi<A, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<A, C> CachedApi<A, C>
where
    A: TogglyApi,
    C: CacheBackend + ?Sized,
{
    pub fn new(inner: A, cache: Arc<C>) -> Self {
        Self {
            inner,
            cache: Some(cache),
        }
    }

    /// A decorator with caching disabled.
    pub fn passthrough(inner: A) -> Self {
        Self { inner, cache: None }
    }

    pub fn with_cache(inner: A, cache: Option<Arc<C>>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn cache(&self) -> Option<&Arc<C>> {
        self.cache.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    async fn read_through<T, F>(&self, key: CacheKey, load: F) -> TogglyResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Future<Output = TogglyResult<T>> + Send,
    {
        let Some(cache) = &self.cache else {
            return load.await.map(CacheRead::from_origin);
        };

        let cached = cache.get(&key).await.map_err(|err| {
            error!(key = %key, error = %err, "Cache get failed");
            TogglyError::from(err)
        })?;
        if let Some(bytes) = cached {
            let value = serde_json::from_slice(&bytes).map_err(|err| {
                error!(key = %key, error = %err, "Cached entry is not decodable");
                CacheError::Serialization {
                    key: key.to_string(),
                    reason: err.to_string(),
                }
            })?;
            debug!(key = %key, "Cache hit");
            return Ok(CacheRead::from_cache(value));
        }

        debug!(key = %key, "Cache miss");
        let value = load.await?;
        let bytes = serde_json::to_vec(&value).map_err(|err| CacheError::Serialization {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        cache.set(&key, bytes).await.map_err(|err| {
            error!(key = %key, error = %err, "Cache set failed");
            TogglyError::from(err)
        })?;
        Ok(CacheRead::from_origin(value))
    }

    async fn flush(&self, keys: Vec<CacheKey>) -> TogglyResult<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        debug!(keys = ?keys.iter().map(CacheKey::as_str).collect::<Vec<_>>(), "Flushing cache keys");
        cache.flush(&keys).await.map_err(|err| {
            error!(error = %err, "Cache flush failed");
            TogglyError::from(err)
        })
    }

    // ========================================================================
    // READS WITH PROVENANCE
    // ========================================================================

    pub async fn project_list_read(&self, owner: &OwnerId) -> TogglyResult<CacheRead<Vec<Project>>> {
        self.read_through(CacheKey::project_list(owner), self.inner.project_list(owner))
            .await
    }

    pub async fn project_get_read(
        &self,
        owner: &OwnerId,
        code: &ProjectCode,
    ) -> TogglyResult<CacheRead<Project>> {
        self.read_through(CacheKey::project(owner, code), self.inner.project_get(owner, code))
            .await
    }

    pub async fn environment_list_read(
        &self,
        scope: &ProjectScope,
    ) -> TogglyResult<CacheRead<Vec<Environment>>> {
        self.read_through(
            CacheKey::environment_list(scope),
            self.inner.environment_list(scope),
        )
        .await
    }

    pub async fn environment_get_read(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<CacheRead<Environment>> {
        self.read_through(
            CacheKey::environment(scope, code),
            self.inner.environment_get(scope, code),
        )
        .await
    }

    pub async fn object_list_read(
        &self,
        scope: &EnvironmentScope,
    ) -> TogglyResult<CacheRead<Vec<Object>>> {
        self.read_through(CacheKey::object_list(scope), self.inner.object_list(scope))
            .await
    }

    pub async fn object_get_read(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<CacheRead<Object>> {
        self.read_through(
            CacheKey::object(scope, code),
            self.inner.object_get(scope, code),
        )
        .await
    }
}

#[async_trait]
impl<A, C> TogglyApi for CachedApi<A, C>
where
    A: TogglyApi,
    C: CacheBackend + ?Sized,
{
    async fn project_list(&self, owner: &OwnerId) -> TogglyResult<Vec<Project>> {
        self.project_list_read(owner).await.map(CacheRead::into_value)
    }

    async fn project_get(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<Project> {
        self.project_get_read(owner, code)
            .await
            .map(CacheRead::into_value)
    }

    async fn project_create(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project> {
        let project = self.inner.project_create(owner, info).await?;
        self.flush(vec![CacheKey::project_list(owner)]).await?;
        Ok(project)
    }

    async fn project_update(&self, owner: &OwnerId, info: ProjectInfo) -> TogglyResult<Project> {
        let project = self.inner.project_update(owner, info).await?;
        self.flush(vec![
            CacheKey::project_list(owner),
            CacheKey::project(owner, &project.code),
        ])
        .await?;
        Ok(project)
    }

    async fn project_delete(&self, owner: &OwnerId, code: &ProjectCode) -> TogglyResult<()> {
        self.inner.project_delete(owner, code).await?;
        self.flush(vec![
            CacheKey::project_list(owner),
            CacheKey::project(owner, code),
            CacheKey::environment_list(&owner.project(code.clone())),
        ])
        .await
    }

    async fn environment_list(&self, scope: &ProjectScope) -> TogglyResult<Vec<Environment>> {
        self.environment_list_read(scope)
            .await
            .map(CacheRead::into_value)
    }

    async fn environment_get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<Environment> {
        self.environment_get_read(scope, code)
            .await
            .map(CacheRead::into_value)
    }

    async fn environment_create(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment> {
        let env = self.inner.environment_create(scope, info).await?;
        self.flush(vec![CacheKey::environment_list(scope)]).await?;
        Ok(env)
    }

    async fn environment_update(
        &self,
        scope: &ProjectScope,
        info: EnvironmentInfo,
    ) -> TogglyResult<Environment> {
        let env = self.inner.environment_update(scope, info).await?;
        self.flush(vec![
            CacheKey::environment_list(scope),
            CacheKey::environment(scope, &env.code),
        ])
        .await?;
        Ok(env)
    }

    async fn environment_delete(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> TogglyResult<()> {
        self.inner.environment_delete(scope, code).await?;
        self.flush(vec![
            CacheKey::environment_list(scope),
            CacheKey::environment(scope, code),
            CacheKey::object_list(&scope.environment(code.clone())),
        ])
        .await
    }

    async fn object_list(&self, scope: &EnvironmentScope) -> TogglyResult<Vec<Object>> {
        self.object_list_read(scope).await.map(CacheRead::into_value)
    }

    async fn object_get(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<Object> {
        self.object_get_read(scope, code)
            .await
            .map(CacheRead::into_value)
    }

    async fn object_create(
        &self,
        scope: &EnvironmentScope,
        info: ObjectInfo,
    ) -> TogglyResult<Object> {
        let object = self.inner.object_create(scope, info).await?;
        self.flush(vec![CacheKey::object_list(scope)]).await?;
        Ok(object)
    }

    async fn object_update(
        &self,
        scope: &EnvironmentScope,
        info: ObjectInfo,
    ) -> TogglyResult<Object> {
        let object = self.inner.object_update(scope, info).await?;
        if !self.is_enabled() {
            return Ok(object);
        }

        let mut keys = vec![
            CacheKey::object_list(scope),
            CacheKey::object(scope, &object.code),
        ];
        let inheritors = self
            .inner
            .object_inheritors_flat_list(scope, &object.code)
            .await?;
        for inheritor in &inheritors {
            let inheritor_scope = inheritor.scope();
            for key in [
                CacheKey::object_list(&inheritor_scope),
                CacheKey::object(&inheritor_scope, &inheritor.code),
            ] {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        self.flush(keys).await?;
        Ok(object)
    }

    async fn object_delete(&self, scope: &EnvironmentScope, code: &ObjectCode) -> TogglyResult<()> {
        self.inner.object_delete(scope, code).await?;
        self.flush(vec![
            CacheKey::object_list(scope),
            CacheKey::object(scope, code),
        ])
        .await
    }

    async fn object_inheritors_flat_list(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> TogglyResult<Vec<Object>> {
        warn!(scope = %scope, object = %code, "Inheritors flat list is not cached");
        self.inner.object_inheritors_flat_list(scope, code).await
    }
}
