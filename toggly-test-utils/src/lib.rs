//! Toggly Test Utilities
//!
//! Shared test infrastructure for the Toggly workspace:
//! - Fixtures that seed a project/environment and canonical object chains
//! - Proptest generators for codes and parameters
//! - Storage and cache doubles that inject backend failures
//! - Assertions for Toggly error outcomes

pub use toggly_core::{
    EnvironmentInfo, EnvironmentScope, Object, ObjectCode, ObjectInfo, ObjectRef, OwnerId,
    Parameter, ParameterInput, ParameterValue, ProjectInfo, ProjectScope, TogglyError,
    TogglyResult,
};
pub use toggly_storage::{InMemoryCacheBackend, InMemoryStorage};

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use toggly_core::{
    CacheError, Environment, EnvironmentCode, Project, ProjectCode, StorageError,
};
use toggly_storage::{CacheBackend, CacheKey, CacheResult, CacheStats, DataStorage, StorageResult};

// ============================================================================
// FAILURE-INJECTING DOUBLES
// ============================================================================

/// Storage wrapper that fails selected operations with a backend error.
///
/// Operation names match the [`DataStorage`] method names.
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: InMemoryStorage,
    failing: RwLock<HashSet<&'static str>>,
}

impl FailingStorage {
    pub fn new(inner: InMemoryStorage) -> Self {
        Self {
            inner,
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Make `operation` fail from now on.
    pub fn fail(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(operation);
        }
    }

    /// Stop failing every operation.
    pub fn heal(&self) {
        if let Ok(mut failing) = self.failing.write() {
            failing.clear();
        }
    }

    fn check(&self, operation: &'static str) -> StorageResult<()> {
        let failing = self.failing.read().map_err(|_| StorageError::LockPoisoned)?;
        if failing.contains(operation) {
            return Err(StorageError::Backend {
                reason: format!("injected failure in {}", operation),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataStorage for FailingStorage {
    async fn project_list(&self, owner: &OwnerId) -> StorageResult<Vec<Project>> {
        self.check("project_list")?;
        self.inner.project_list(owner).await
    }

    async fn project_get(&self, owner: &OwnerId, code: &ProjectCode) -> StorageResult<Option<Project>> {
        self.check("project_get")?;
        self.inner.project_get(owner, code).await
    }

    async fn project_save(&self, project: &Project) -> StorageResult<()> {
        self.check("project_save")?;
        self.inner.project_save(project).await
    }

    async fn project_update(&self, project: &Project) -> StorageResult<()> {
        self.check("project_update")?;
        self.inner.project_update(project).await
    }

    async fn project_delete(&self, owner: &OwnerId, code: &ProjectCode) -> StorageResult<()> {
        self.check("project_delete")?;
        self.inner.project_delete(owner, code).await
    }

    async fn environment_list(&self, scope: &ProjectScope) -> StorageResult<Vec<Environment>> {
        self.check("environment_list")?;
        self.inner.environment_list(scope).await
    }

    async fn environment_get(
        &self,
        scope: &ProjectScope,
        code: &EnvironmentCode,
    ) -> StorageResult<Option<Environment>> {
        self.check("environment_get")?;
        self.inner.environment_get(scope, code).await
    }

    async fn environment_save(&self, env: &Environment) -> StorageResult<()> {
        self.check("environment_save")?;
        self.inner.environment_save(env).await
    }

    async fn environment_update(&self, env: &Environment) -> StorageResult<()> {
        self.check("environment_update")?;
        self.inner.environment_update(env).await
    }

    async fn environment_delete(&self, scope: &ProjectScope, code: &EnvironmentCode) -> StorageResult<()> {
        self.check("environment_delete")?;
        self.inner.environment_delete(scope, code).await
    }

    async fn object_list(&self, scope: &EnvironmentScope) -> StorageResult<Vec<Object>> {
        self.check("object_list")?;
        self.inner.object_list(scope).await
    }

    async fn object_get(&self, scope: &EnvironmentScope, code: &ObjectCode) -> StorageResult<Option<Object>> {
        self.check("object_get")?;
        self.inner.object_get(scope, code).await
    }

    async fn object_save(&self, object: &Object) -> StorageResult<()> {
        self.check("object_save")?;
        self.inner.object_save(object).await
    }

    async fn object_update(&self, object: &Object) -> StorageResult<()> {
        self.check("object_update")?;
        self.inner.object_update(object).await
    }

    async fn object_delete(&self, scope: &EnvironmentScope, code: &ObjectCode) -> StorageResult<()> {
        self.check("object_delete")?;
        self.inner.object_delete(scope, code).await
    }

    async fn object_list_inheritors(&self, owner: &OwnerId, parent: &ObjectRef) -> StorageResult<Vec<Object>> {
        self.check("object_list_inheritors")?;
        self.inner.object_list_inheritors(owner, parent).await
    }
}

/// Cache backend whose every call fails.
#[derive(Debug, Clone, Default)]
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &CacheKey, _value: Vec<u8>) -> CacheResult<()> {
        Err(unavailable())
    }

    async fn flush(&self, _keys: &[CacheKey]) -> CacheResult<()> {
        Err(unavailable())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Err(unavailable())
    }
}

fn unavailable() -> CacheError {
    CacheError::Backend {
        reason: "cache unavailable".to_string(),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest generators for Toggly inputs.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// A non-empty identifier-like code.
    pub fn arb_code() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,11}"
    }

    pub fn arb_parameter_value() -> impl Strategy<Value = ParameterValue> {
        prop_oneof![
            any::<bool>().prop_map(ParameterValue::Bool),
            any::<i64>().prop_map(ParameterValue::Int),
            "[ -~]{0,16}".prop_map(ParameterValue::String),
        ]
    }

    /// A well-formed parameter input.
    pub fn arb_parameter_input() -> impl Strategy<Value = ParameterInput> {
        (arb_code(), arb_parameter_value(), "[ -~]{0,16}").prop_map(|(code, value, description)| {
            ParameterInput::raw(code, value.param_type().as_str(), value.to_json())
                .with_description(description)
        })
    }

    /// Well-formed parameter inputs with distinct codes.
    pub fn arb_parameter_inputs(max: usize) -> impl Strategy<Value = Vec<ParameterInput>> {
        proptest::collection::btree_map(arb_code(), arb_parameter_value(), 0..=max).prop_map(
            |params| {
                params
                    .into_iter()
                    .map(|(code, value)| {
                        ParameterInput::raw(code, value.param_type().as_str(), value.to_json())
                    })
                    .collect()
            },
        )
    }

    /// A JSON value of the wrong shape for `type_name`.
    pub fn arb_mismatched_value(type_name: &'static str) -> impl Strategy<Value = Value> {
        let candidates: Vec<Value> = match type_name {
            "bool" => vec![json!(1), json!("true"), json!([true])],
            "int" => vec![json!(true), json!("1"), json!(1.5)],
            _ => vec![json!(true), json!(1), json!({"s": "x"})],
        };
        proptest::sample::select(candidates)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use toggly_engine::{CachedApi, Engine, TogglyApi};

    pub const OWNER: &str = "ow1";
    pub const PROJECT: &str = "project1";
    pub const ENVIRONMENT: &str = "env1";

    /// `ow1:project1:env1`.
    pub fn env_scope() -> EnvironmentScope {
        OwnerId::new(OWNER).project(PROJECT).environment(ENVIRONMENT)
    }

    /// Create the project and environment of `scope` through `api`.
    pub async fn seed_environment<A>(api: &A, scope: &EnvironmentScope) -> TogglyResult<()>
    where
        A: TogglyApi + ?Sized,
    {
        let project = scope.project_scope();
        api.project_create(&project.owner, ProjectInfo::new(project.project.clone()))
            .await?;
        api.environment_create(&project, EnvironmentInfo::new(scope.environment.clone()))
            .await?;
        Ok(())
    }

    /// An uncached engine over fresh storage with [`env_scope`] seeded.
    pub async fn seeded_engine() -> TogglyResult<(Engine<InMemoryStorage>, Arc<InMemoryStorage>, EnvironmentScope)> {
        let storage = Arc::new(InMemoryStorage::new());
        let engine = Engine::new(Arc::clone(&storage));
        let scope = env_scope();
        seed_environment(&engine, &scope).await?;
        Ok((engine, storage, scope))
    }

    /// A cached engine over fresh storage with [`env_scope`] seeded.
    pub async fn seeded_cached_engine() -> TogglyResult<(
        CachedApi<Engine<InMemoryStorage>, InMemoryCacheBackend>,
        Arc<InMemoryCacheBackend>,
        EnvironmentScope,
    )> {
        let storage = Arc::new(InMemoryStorage::new());
        let cache = Arc::new(InMemoryCacheBackend::new());
        let api = CachedApi::new(Engine::new(storage), Arc::clone(&cache));
        let scope = env_scope();
        seed_environment(&api, &scope).await?;
        Ok((api, cache, scope))
    }

    /// `obj1 {param1: bool = true, param2: bool = true}`.
    pub fn obj1_info() -> ObjectInfo {
        ObjectInfo::new("obj1")
            .with_description("Object 1")
            .parameter(ParameterInput::bool("param1", true).with_description("Param 1"))
            .parameter(ParameterInput::bool("param2", true).with_description("Param 2"))
    }

    /// `obj2 inherits obj1 {param2: bool = false, param3: string = "value"}`.
    pub fn obj2_info(scope: &EnvironmentScope) -> ObjectInfo {
        ObjectInfo::new("obj2")
            .with_description("Object 2")
            .inherits(scope.object_ref("obj1"))
            .parameter(ParameterInput::bool("param2", false).with_description("Child param 2"))
            .parameter(ParameterInput::string("param3", "value").with_description("Param 3"))
    }

    /// `obj3 inherits obj2 {param3: string = "value2"}`.
    pub fn obj3_info(scope: &EnvironmentScope) -> ObjectInfo {
        ObjectInfo::new("obj3")
            .with_description("Object 3")
            .inherits(scope.object_ref("obj2"))
            .parameter(ParameterInput::string("param3", "value2"))
    }

    /// Create obj1, obj2 and obj3 in `scope`.
    pub async fn seed_chain<A>(api: &A, scope: &EnvironmentScope) -> TogglyResult<()>
    where
        A: TogglyApi + ?Sized,
    {
        api.object_create(scope, obj1_info()).await?;
        api.object_create(scope, obj2_info(scope)).await?;
        api.object_create(scope, obj3_info(scope)).await?;
        Ok(())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Toggly error outcomes.

    use super::*;

    /// Assert that a result is a BadRequest with exactly `reason`.
    pub fn assert_bad_request<T: std::fmt::Debug>(result: &TogglyResult<T>, reason: &str) {
        match result {
            Err(TogglyError::BadRequest { reason: actual }) => assert_eq!(actual, reason),
            other => panic!("Expected BadRequest({}), got {:?}", reason, other),
        }
    }

    /// Assert that a result is an ObjectParameter error for `name` whose
    /// reason starts with `reason_prefix`.
    pub fn assert_object_parameter<T: std::fmt::Debug>(
        result: &TogglyResult<T>,
        name: &str,
        reason_prefix: &str,
    ) {
        match result {
            Err(TogglyError::ObjectParameter {
                name: actual,
                reason,
            }) => {
                assert_eq!(actual, name);
                assert!(
                    reason.starts_with(reason_prefix),
                    "Expected reason starting with {:?}, got {:?}",
                    reason_prefix,
                    reason
                );
            }
            other => panic!("Expected ObjectParameter({}), got {:?}", name, other),
        }
    }

    /// Assert that a result is an internal storage failure.
    pub fn assert_storage_failure<T: std::fmt::Debug>(result: &TogglyResult<T>) {
        match result {
            Err(err @ TogglyError::Storage(_)) => assert!(err.is_internal()),
            other => panic!("Expected storage failure, got {:?}", other),
        }
    }

    /// Assert the parameter codes of an object, in order.
    pub fn assert_parameter_codes(object: &Object, expected: &[&str]) {
        let codes: Vec<&str> = object.parameters.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, expected, "parameter order of {}", object.code);
    }
}
