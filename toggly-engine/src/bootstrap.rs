//! Wiring of storage, cache and configuration into a ready API.

use std::sync::Arc;

use toggly_core::TogglyResult;
use toggly_storage::{DataStorage, InMemoryCacheBackend};

use crate::api::Engine;
use crate::cached::CachedApi;
use crate::config::{CacheConfig, EngineConfig};

/// The API as assembled by [`build`].
pub type TogglyService<S> = CachedApi<Engine<S>, InMemoryCacheBackend>;

/// Build the in-memory cache backend a config asks for, if any.
pub fn cache_backend(config: &CacheConfig) -> Option<Arc<InMemoryCacheBackend>> {
    if !config.enabled {
        return None;
    }
    let mut backend = InMemoryCacheBackend::new();
    if let Some(ttl) = config.ttl {
        backend = backend.with_ttl(ttl);
    }
    if let Some(max_entries) = config.max_entries {
        backend = backend.with_max_entries(max_entries);
    }
    Some(Arc::new(backend))
}

/// Validate `config` and assemble the cached engine over `storage`.
pub fn build<S>(storage: Arc<S>, config: &EngineConfig) -> TogglyResult<TogglyService<S>>
where
    S: DataStorage + ?Sized + 'static,
{
    config.validate()?;
    let cache = cache_backend(&config.cache);
    tracing::info!(
        cache_enabled = cache.is_some(),
        cache_ttl_secs = ?config.cache.ttl.map(|ttl| ttl.as_secs()),
        cache_max_entries = ?config.cache.max_entries,
        "Toggly engine ready"
    );
    Ok(CachedApi::with_cache(Engine::new(storage), cache))
}
