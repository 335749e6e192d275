//! Toggly Storage - Storage Port, Cache Port and In-Memory Adapters
//!
//! Defines the persistence abstraction the engine depends on. Concrete
//! document-store adapters live outside this workspace; [`InMemoryStorage`]
//! is the reference implementation used by tests and embedders.

pub mod cache;
pub mod memory;

pub use cache::{
    CacheBackend, CacheKey, CacheRead, CacheResult, CacheStats, InMemoryCacheBackend, ReadSource,
};
pub use memory::InMemoryStorage;

use async_trait::async_trait;
use toggly_core::{
    Environment, EnvironmentCode, EnvironmentScope, Object, ObjectCode, ObjectRef, OwnerId,
    Project, ProjectCode, ProjectScope, StorageError,
};

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage port for Toggly entities.
///
/// Every call is scoped by owner, and by project/environment where the
/// entity lives below them.
///
/// # Contract
///
/// - `*_get` returns `Ok(None)` for a missing row.
/// - `*_save` fails with [`StorageError::UniqueIndex`] when the code is
///   already taken inside its scope.
/// - `*_update` and `*_delete` fail with [`StorageError::NotFound`] for a
///   missing row.
/// - `*_list` preserves insertion order.
///
/// # Concurrency
///
/// There is no optimistic concurrency control: two writers updating the same
/// row race and the last write wins. Adapters must be safe to call from many
/// tasks at once; the engine adds no locking of its own.
#[async_trait]
pub trait DataStorage: Send + Sync {
    // ========================================================================
    // PROJECT OPERATIONS
    // ========================================================================

    /// List all projects of an owner.
    async fn project_list(&self, owner: &OwnerId) -> StorageResult<Vec<Project>>;

    /// Get a project by code.
    async fn project_get(&self, owner: &OwnerId, code: &ProjectCode)
        -> StorageResult<Option<Project>>;

    /// Insert a new project.
    async fn project_save(&self, project: &Project) -> StorageResult<()>;

    /// Replace an existing project.
    async fn project_update(&self, project: &Project) -> StorageResult<()>;

    /// Delete a project.
    async fn project_delete(&self, owner: &OwnerId, code: &ProjectCode) -> StorageResult<()>;

    // ========================================================================
    // ENVIRONMENT OPERATIONS
    // ========================================================================

    /// List all environments of a project.
    async fn environment_list(&self, scope: &ProjectScope) -> StorageResult<Vec<Environment>>;

    /// Get an environment by code.
    async fn environment_get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> StorageResult<Option<Environment>>;

    /// Insert a new environment.
    async fn environment_save(&self, env: &Environment) -> StorageResult<()>;

    /// Replace an existing environment.
    async fn environment_update(&self, env: &Environment) -> StorageResult<()>;

    /// Delete an environment.
    async fn environment_delete(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> StorageResult<()>;

    // ========================================================================
    // OBJECT OPERATIONS
    // ========================================================================

    /// List all objects of an environment, as stored (unresolved).
    async fn object_list(&self, scope: &EnvironmentScope) -> StorageResult<Vec<Object>>;

    /// Get an object by code, as stored (unresolved).
    async fn object_get(
        &self,
        scope: &EnvironmentScope,
        code: &ObjectCode,
    ) -> StorageResult<Option<Object>>;

    /// Insert a new object.
    async fn object_save(&self, object: &Object) -> StorageResult<()>;

    /// Replace an existing object.
    async fn object_update(&self, object: &Object) -> StorageResult<()>;

    /// Delete an object.
    async fn object_delete(&self, scope: &EnvironmentScope, code: &ObjectCode)
        -> StorageResult<()>;

    /// List direct inheritors of an object: every object of the owner, in any
    /// project or environment, whose `inherits` equals `parent`.
    async fn object_list_inheritors(
        &self,
        owner: &OwnerId,
        parent: &ObjectRef,
    ) -> StorageResult<Vec<Object>>;
}
