//! Property tests over the resolved object view.

use proptest::prelude::*;
use serde_json::json;
use tokio::runtime::Runtime;
use toggly_core::{ObjectCode, ObjectInfo, ParameterInput, TogglyError};
use toggly_engine::TogglyApi;
use toggly_test_utils::fixtures::{obj1_info, seeded_engine};
use toggly_test_utils::generators::{
    arb_mismatched_value, arb_parameter_input, arb_parameter_inputs,
};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Without a parent, what is created is what is read back, twice.
    #[test]
    fn prop_create_get_round_trip(inputs in arb_parameter_inputs(6)) {
        let rt = runtime();
        let (created, first, second) = rt.block_on(async {
            let (engine, _, scope) = seeded_engine().await.unwrap();
            let mut info = ObjectInfo::new("prop");
            info.parameters = inputs.clone();
            let created = engine.object_create(&scope, info).await.unwrap();
            let first = engine.object_get(&scope, &ObjectCode::new("prop")).await.unwrap();
            let second = engine.object_get(&scope, &ObjectCode::new("prop")).await.unwrap();
            (created, first, second)
        });

        prop_assert_eq!(&created, &first);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(created.parameters.len(), inputs.len());
        for (param, input) in created.parameters.iter().zip(&inputs) {
            prop_assert_eq!(&param.code, &input.code);
            prop_assert_eq!(Some(param.value.to_json()), input.value.clone());
        }
    }

    /// A parameter limited to its own value keeps value, description and
    /// allow-list through validation.
    #[test]
    fn prop_allow_listed_parameter_accepted(input in arb_parameter_input()) {
        let raw = input.value.clone().unwrap_or_default();
        let input = input.with_allowed_values(vec![raw.clone()]);

        let rt = runtime();
        let object = rt.block_on(async {
            let (engine, _, scope) = seeded_engine().await.unwrap();
            let info = ObjectInfo::new("allowed").parameter(input.clone());
            engine.object_create(&scope, info).await.unwrap()
        });

        prop_assert_eq!(object.parameters.len(), 1);
        let param = &object.parameters[0];
        prop_assert_eq!(&param.description, &input.description);
        prop_assert_eq!(param.value.to_json(), raw);
        prop_assert_eq!(param.allowed_values.as_ref().map(Vec::len), Some(1));
    }

    /// A child of obj1 sees exactly obj1's codes plus its own new ones.
    #[test]
    fn prop_child_sees_union_of_codes(inputs in arb_parameter_inputs(4)) {
        // Keep clear of obj1's own codes so no type conflict arises.
        let inputs: Vec<ParameterInput> = inputs
            .into_iter()
            .filter(|p| !p.code.as_str().starts_with("param"))
            .collect();

        let rt = runtime();
        let child = rt.block_on(async {
            let (engine, _, scope) = seeded_engine().await.unwrap();
            engine.object_create(&scope, obj1_info()).await.unwrap();
            let mut info = ObjectInfo::new("child").inherits(scope.object_ref("obj1"));
            info.parameters = inputs.clone();
            engine.object_create(&scope, info).await.unwrap()
        });

        prop_assert_eq!(child.parameters.len(), 2 + inputs.len());
        prop_assert_eq!(child.parameters[0].code.as_str(), "param1");
        prop_assert_eq!(child.parameters[1].code.as_str(), "param2");
    }

    /// Values that do not fit the declared type are rejected as bad requests.
    #[test]
    fn prop_mismatched_values_rejected(
        (type_name, value) in prop_oneof![
            Just("bool"), Just("int"), Just("string")
        ].prop_flat_map(|t| (Just(t), arb_mismatched_value(t)))
    ) {
        let rt = runtime();
        let result = rt.block_on(async {
            let (engine, _, scope) = seeded_engine().await.unwrap();
            let info = ObjectInfo::new("o").parameter(ParameterInput::raw("p", type_name, value));
            engine.object_create(&scope, info).await
        });
        prop_assert!(matches!(result, Err(TogglyError::BadRequest { .. })), "expected BadRequest, got {:?}", result);
    }
}

#[test]
fn test_null_value_counts_as_missing() {
    let result = runtime().block_on(async {
        let (engine, _, scope) = seeded_engine().await.unwrap();
        let info = ObjectInfo::new("o").parameter(ParameterInput::raw("p", "bool", json!(null)));
        engine.object_create(&scope, info).await
    });
    assert_eq!(
        result,
        Err(TogglyError::bad_request("Parameter value not specified"))
    );
}
