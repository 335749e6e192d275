//! Object service behavior: resolution, write guards and deletion rules.

use serde_json::json;
use toggly_core::{
    EnvironmentInfo, ObjectCode, ObjectInfo, ObjectRef, ParameterInput, ParameterValue,
    ProjectInfo, TogglyError,
};
use toggly_engine::TogglyApi;
use toggly_storage::DataStorage;
use toggly_test_utils::assertions::{
    assert_bad_request, assert_object_parameter, assert_parameter_codes,
};
use toggly_test_utils::fixtures::{
    obj1_info, obj2_info, obj3_info, seed_chain, seed_environment, seeded_engine,
};

fn code(s: &str) -> ObjectCode {
    ObjectCode::new(s)
}

#[tokio::test]
async fn test_object_without_parent_round_trips() {
    let (engine, _, scope) = seeded_engine().await.unwrap();

    let created = engine.object_create(&scope, obj1_info()).await.unwrap();
    let fetched = engine.object_get(&scope, &code("obj1")).await.unwrap();

    assert_eq!(created, fetched);
    assert_eq!(fetched.description, "Object 1");
    assert_eq!(fetched.inherits, None);
    assert_parameter_codes(&fetched, &["param1", "param2"]);
    assert_eq!(fetched.parameters[0].value, ParameterValue::Bool(true));
    assert_eq!(fetched.parameters[0].description, "Param 1");
}

#[tokio::test]
async fn test_override_precedence() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();

    let obj2 = engine.object_create(&scope, obj2_info(&scope)).await.unwrap();

    assert_eq!(obj2.parameters.len(), 3);
    let param1 = obj2.parameter("param1").unwrap();
    assert_eq!(param1.value, ParameterValue::Bool(true));
    assert_eq!(param1.description, "Param 1");

    let param2 = obj2.parameter("param2").unwrap();
    assert_eq!(param2.value, ParameterValue::Bool(false));
    assert_eq!(param2.description, "Param 2");

    let param3 = obj2.parameter("param3").unwrap();
    assert_eq!(param3.value, ParameterValue::from("value"));
    assert_eq!(param3.description, "Param 3");

    assert_parameter_codes(&obj2, &["param2", "param1", "param3"]);
}

#[tokio::test]
async fn test_deep_chain_merge() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();

    let obj3 = engine.object_get(&scope, &code("obj3")).await.unwrap();

    assert_eq!(obj3.parameters.len(), 3);
    assert_eq!(obj3.parameter("param1").unwrap().value, ParameterValue::Bool(true));
    assert_eq!(obj3.parameter("param2").unwrap().value, ParameterValue::Bool(false));
    assert_eq!(obj3.parameter("param3").unwrap().value, ParameterValue::from("value2"));
    // Override keeps the nearest declaring ancestor's description.
    assert_eq!(obj3.parameter("param3").unwrap().description, "Param 3");
}

#[tokio::test]
async fn test_list_resolves_each_object_in_storage_order() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();

    let objects = engine.object_list(&scope).await.unwrap();
    let codes: Vec<&str> = objects.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(codes, vec!["obj1", "obj2", "obj3"]);
    let sizes: Vec<usize> = objects.iter().map(|o| o.parameters.len()).collect();
    assert_eq!(sizes, vec![2, 3, 3]);
}

#[tokio::test]
async fn test_type_mismatch_with_parent_rejected() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();

    let info = ObjectInfo::new("bad")
        .inherits(scope.object_ref("obj1"))
        .parameter(ParameterInput::string("param2", "not a bool"));
    let result = engine.object_create(&scope, info).await;

    assert_eq!(result, Err(TogglyError::ObjectInheritorTypeMismatch));
    assert_eq!(
        engine.object_get(&scope, &code("bad")).await,
        Err(TogglyError::ObjectNotFound)
    );
}

#[tokio::test]
async fn test_type_guard_is_shallow_but_resolution_is_not() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();

    // param1 is declared by obj1, not by the immediate parent obj2, so the
    // write guard lets it through...
    let info = ObjectInfo::new("obj4")
        .inherits(scope.object_ref("obj2"))
        .parameter(ParameterInput::int("param1", 5));
    let result = engine.object_create(&scope, info).await;

    // ...and the resolved read then detects the mismatch.
    assert_eq!(result, Err(TogglyError::ObjectInheritorTypeMismatch));
    assert!(engine.object_list(&scope).await.is_err());
}

#[tokio::test]
async fn test_missing_parent_rejected() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();

    for parent in [
        ObjectRef::new("no_project", "env1", "obj1"),
        ObjectRef::new("project1", "no_env", "obj1"),
        ObjectRef::new("project1", "env1", "no_object"),
    ] {
        let info = ObjectInfo::new("child").inherits(parent);
        assert_eq!(
            engine.object_create(&scope, info).await,
            Err(TogglyError::ObjectParentNotExists)
        );
    }
}

#[tokio::test]
async fn test_parent_in_other_environment() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();

    let project = scope.project_scope();
    engine
        .environment_create(&project, EnvironmentInfo::new("env2"))
        .await
        .unwrap();
    let env2 = project.environment("env2");

    let child = ObjectInfo::new("remote")
        .inherits(scope.object_ref("obj1"))
        .parameter(ParameterInput::bool("param1", false));
    let remote = engine.object_create(&env2, child).await.unwrap();
    assert_eq!(remote.parameter("param1").unwrap().value, ParameterValue::Bool(false));
    assert_eq!(remote.parameter("param2").unwrap().value, ParameterValue::Bool(true));

    // Inheritors are tracked across environments.
    assert_eq!(
        engine.object_delete(&scope, &code("obj1")).await,
        Err(TogglyError::ObjectHasInheritors)
    );
    let flat = engine
        .object_inheritors_flat_list(&scope, &code("obj1"))
        .await
        .unwrap();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].env_code.as_str(), "env2");
}

#[tokio::test]
async fn test_parent_in_other_project() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();

    let other = scope.owner.project("project2").environment("prod");
    seed_environment(&engine, &other).await.unwrap();

    let child = ObjectInfo::new("obj1").inherits(scope.object_ref("obj1"));
    let resolved = engine.object_create(&other, child).await.unwrap();
    assert_parameter_codes(&resolved, &["param1", "param2"]);
}

#[tokio::test]
async fn test_deletion_ordering() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();
    engine.object_create(&scope, obj2_info(&scope)).await.unwrap();

    assert_eq!(
        engine.object_delete(&scope, &code("obj1")).await,
        Err(TogglyError::ObjectHasInheritors)
    );
    engine.object_delete(&scope, &code("obj2")).await.unwrap();
    engine.object_delete(&scope, &code("obj1")).await.unwrap();

    assert_eq!(
        engine.object_delete(&scope, &code("obj1")).await,
        Err(TogglyError::ObjectNotFound)
    );
}

#[tokio::test]
async fn test_update_collision_guard() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine
        .object_create(
            &scope,
            ObjectInfo::new("obj1").parameter(ParameterInput::bool("param1", true)),
        )
        .await
        .unwrap();
    engine
        .object_create(
            &scope,
            ObjectInfo::new("obj2")
                .inherits(scope.object_ref("obj1"))
                .parameter(ParameterInput::bool("param1", false)),
        )
        .await
        .unwrap();
    engine
        .object_create(
            &scope,
            ObjectInfo::new("obj3")
                .inherits(scope.object_ref("obj2"))
                .parameter(ParameterInput::string("param2", "own")),
        )
        .await
        .unwrap();

    let change_type = ObjectInfo::new("obj1").parameter(ParameterInput::int("param1", 1));
    assert_object_parameter(
        &engine.object_update(&scope, change_type).await,
        "param1",
        "Object parameter type changing restricted",
    );

    let shadow = ObjectInfo::new("obj1")
        .parameter(ParameterInput::bool("param1", true))
        .parameter(ParameterInput::bool("param2", true));
    assert_object_parameter(
        &engine.object_update(&scope, shadow).await,
        "param2",
        "Object parameter exists in inheritor: project1:env1:obj3",
    );

    // Changing a value without touching types is fine.
    let revalue = ObjectInfo::new("obj1").parameter(ParameterInput::bool("param1", false));
    let obj1 = engine.object_update(&scope, revalue).await.unwrap();
    assert_eq!(obj1.parameter("param1").unwrap().value, ParameterValue::Bool(false));
}

#[tokio::test]
async fn test_update_rechecks_parent() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();

    let orphaned = ObjectInfo::new("obj3").inherits(scope.object_ref("missing"));
    assert_eq!(
        engine.object_update(&scope, orphaned).await,
        Err(TogglyError::ObjectParentNotExists)
    );

    // param2 is new to obj3 but obj2 declares it as bool.
    let mismatch = ObjectInfo::new("obj3")
        .inherits(scope.object_ref("obj2"))
        .parameter(ParameterInput::string("param3", "value2"))
        .parameter(ParameterInput::int("param2", 1));
    assert_eq!(
        engine.object_update(&scope, mismatch).await,
        Err(TogglyError::ObjectInheritorTypeMismatch)
    );

    // Detaching from the parent keeps only own parameters.
    let detached = engine
        .object_update(
            &scope,
            ObjectInfo::new("obj3").parameter(ParameterInput::string("param3", "alone")),
        )
        .await
        .unwrap();
    assert_eq!(detached.inherits, None);
    assert_parameter_codes(&detached, &["param3"]);
}

#[tokio::test]
async fn test_update_missing_object() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    assert_eq!(
        engine.object_update(&scope, ObjectInfo::new("ghost")).await,
        Err(TogglyError::ObjectNotFound)
    );
}

#[tokio::test]
async fn test_update_rejects_inheritance_loop() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();

    let to_self = ObjectInfo::new("obj1").inherits(scope.object_ref("obj1"));
    assert!(matches!(
        engine.object_update(&scope, to_self).await,
        Err(TogglyError::InheritanceCycle { .. })
    ));

    let to_grandchild = obj1_info().inherits(scope.object_ref("obj3"));
    match engine.object_update(&scope, to_grandchild).await {
        Err(TogglyError::InheritanceCycle { path }) => assert_eq!(
            path,
            vec![
                "project1:env1:obj1",
                "project1:env1:obj3",
                "project1:env1:obj2",
                "project1:env1:obj1",
            ]
        ),
        other => panic!("expected cycle, got {:?}", other),
    }

    // The chain is untouched.
    let obj1 = engine.object_get(&scope, &code("obj1")).await.unwrap();
    assert_eq!(obj1.inherits, None);
}

#[tokio::test]
async fn test_inheritors_flat_list_order() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();
    engine
        .object_create(
            &scope,
            ObjectInfo::new("obj2b").inherits(scope.object_ref("obj1")),
        )
        .await
        .unwrap();

    let flat = engine
        .object_inheritors_flat_list(&scope, &code("obj1"))
        .await
        .unwrap();
    let codes: Vec<&str> = flat.iter().map(|o| o.code.as_str()).collect();
    // Direct inheritors first, then each one's own inheritors.
    assert_eq!(codes, vec!["obj2", "obj2b", "obj3"]);

    // Stored rows, not resolved views.
    assert_parameter_codes(&flat[0], &["param2", "param3"]);

    assert!(engine
        .object_inheritors_flat_list(&scope, &code("obj3"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_validation_errors() {
    let (engine, _, scope) = seeded_engine().await.unwrap();

    assert_bad_request(
        &engine.object_create(&scope, ObjectInfo::new("")).await,
        "Object code not specified",
    );
    assert_bad_request(
        &engine
            .object_create(
                &scope,
                ObjectInfo::new("o").parameter(ParameterInput::raw("p", "float", json!(1.0))),
            )
            .await,
        "Parameter type not specified or wrong",
    );
    assert_bad_request(
        &engine
            .object_create(
                &scope,
                ObjectInfo::new("o").parameter(ParameterInput::raw("p", "int", json!("1"))),
            )
            .await,
        "Can't cast parameter value `\"1\"` to int",
    );
    assert_bad_request(
        &engine
            .object_update(&scope, ObjectInfo::new("o").parameter(ParameterInput::bool("", true)))
            .await,
        "Parameter code not specified",
    );
}

#[tokio::test]
async fn test_duplicate_object_code() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();
    assert!(matches!(
        engine.object_create(&scope, obj1_info()).await,
        Err(TogglyError::UniqueIndex { .. })
    ));
}

#[tokio::test]
async fn test_missing_environment_or_project() {
    let (engine, _, scope) = seeded_engine().await.unwrap();

    let no_env = scope.project_scope().environment("nope");
    assert_eq!(engine.object_list(&no_env).await, Err(TogglyError::EnvironmentNotFound));
    assert_eq!(
        engine.object_create(&no_env, obj1_info()).await,
        Err(TogglyError::EnvironmentNotFound)
    );

    let no_project = scope.owner.project("nope").environment("env1");
    assert_eq!(
        engine.object_get(&no_project, &code("obj1")).await,
        Err(TogglyError::ProjectNotFound)
    );
    assert_eq!(
        engine.object_delete(&no_project, &code("obj1")).await,
        Err(TogglyError::ProjectNotFound)
    );
}

#[tokio::test]
async fn test_owners_are_isolated() {
    let (engine, _, scope) = seeded_engine().await.unwrap();
    engine.object_create(&scope, obj1_info()).await.unwrap();

    let other = toggly_core::OwnerId::new("ow2");
    engine
        .project_create(&other, ProjectInfo::new("project1"))
        .await
        .unwrap();
    engine
        .environment_create(&other.project("project1"), EnvironmentInfo::new("env1"))
        .await
        .unwrap();
    let other_env = other.project("project1").environment("env1");

    assert!(engine.object_list(&other_env).await.unwrap().is_empty());
    // Another owner cannot inherit from ow1's object.
    let info = ObjectInfo::new("thief").inherits(scope.object_ref("obj1"));
    assert_eq!(
        engine.object_create(&other_env, info).await,
        Err(TogglyError::ObjectParentNotExists)
    );
    // obj3_info references obj2 which does not exist for ow2 either.
    assert_eq!(
        engine.object_create(&other_env, obj3_info(&other_env)).await,
        Err(TogglyError::ObjectParentNotExists)
    );
}

#[tokio::test]
async fn test_stored_loop_is_reported_on_read() {
    let (engine, storage, scope) = seeded_engine().await.unwrap();
    seed_chain(&engine, &scope).await.unwrap();

    // Close obj1 -> obj3 behind the engine's back.
    let mut obj1 = storage
        .object_get(&scope, &code("obj1"))
        .await
        .unwrap()
        .unwrap();
    obj1.inherits = Some(scope.object_ref("obj3"));
    storage.object_update(&obj1).await.unwrap();
    assert_eq!(storage.object_count().unwrap(), 3);

    match engine.object_get(&scope, &code("obj2")).await {
        Err(TogglyError::InheritanceCycle { path }) => assert_eq!(
            path,
            vec![
                "project1:env1:obj2",
                "project1:env1:obj1",
                "project1:env1:obj3",
                "project1:env1:obj2",
            ]
        ),
        other => panic!("expected cycle, got {:?}", other),
    }
    assert!(matches!(
        engine.object_list(&scope).await,
        Err(TogglyError::InheritanceCycle { .. })
    ));

    let flat = engine
        .object_inheritors_flat_list(&scope, &code("obj1"))
        .await
        .unwrap();
    let codes: Vec<&str> = flat.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(codes, vec!["obj2", "obj3"]);
}
