//! Toggly Engine - Inheritance Resolution and Cached API
//!
//! Services for the Projects → Environments → Objects hierarchy on top of a
//! [`DataStorage`](toggly_storage::DataStorage) port, the inheritance resolver that merges an object's
//! parameters with its ancestors', and [`CachedApi`], a read-through cache
//! decorator that invalidates every entry an edit can affect.
//!
//! ```ignore
//! let api = bootstrap::build(Arc::new(InMemoryStorage::new()), &EngineConfig::from_env()?)?;
//! let env = OwnerId::new("ow1").project("p1").environment("dev");
//! let object = api.object_get(&env, &ObjectCode::new("flags")).await?;
//! ```

pub mod api;
pub mod bootstrap;
pub mod cached;
pub mod config;
pub mod environment;
pub mod object;
pub mod project;
pub mod resolve;
pub mod telemetry;
pub mod validation;

pub use api::{Engine, TogglyApi};
pub use cached::CachedApi;
pub use config::{CacheConfig, EngineConfig, LogFormat, TelemetryConfig};
pub use environment::EnvironmentService;
pub use object::ObjectService;
pub use project::ProjectService;

use toggly_core::{StorageError, TogglyError, TogglyResult};
use toggly_storage::StorageResult;

/// Conversion of storage results into engine results.
///
/// Sentinel outcomes (`NotFound`, `UniqueIndex`) are expected and convert
/// silently; anything else is logged with the failing operation before it
/// is surfaced.
pub(crate) trait StorageResultExt<T> {
    fn during(self, operation: &'static str) -> TogglyResult<T>;

    /// Like [`during`](Self::during), mapping `NotFound` to `not_found`.
    fn or_not_found(self, operation: &'static str, not_found: TogglyError) -> TogglyResult<T>;
}

impl<T> StorageResultExt<T> for StorageResult<T> {
    fn during(self, operation: &'static str) -> TogglyResult<T> {
        self.map_err(|err| {
            if !err.is_sentinel() {
                tracing::error!(operation, error = %err, "Storage operation failed");
            }
            TogglyError::from(err)
        })
    }

    fn or_not_found(self, operation: &'static str, not_found: TogglyError) -> TogglyResult<T> {
        match self {
            Err(StorageError::NotFound { .. }) => Err(not_found),
            other => other.during(operation),
        }
    }
}
