//! Input validation for write payloads.
//!
//! Every failure here is a [`TogglyError::BadRequest`].

use std::collections::HashSet;

use serde_json::Value;
use toggly_core::{Parameter, ParameterInput, ParameterType, ParameterValue, TogglyError, TogglyResult};

/// Reject an empty code with the given reason.
pub fn require_code(code: &impl AsRef<str>, reason: &str) -> TogglyResult<()> {
    if code.as_ref().is_empty() {
        return Err(TogglyError::bad_request(reason));
    }
    Ok(())
}

/// Validate an object's parameter list, preserving order.
pub fn validate_parameters(inputs: &[ParameterInput]) -> TogglyResult<Vec<Parameter>> {
    let mut seen = HashSet::with_capacity(inputs.len());
    let mut parameters = Vec::with_capacity(inputs.len());
    for input in inputs {
        let parameter = validate_parameter(input)?;
        if !seen.insert(parameter.code.clone()) {
            return Err(TogglyError::bad_request(format!(
                "Parameter `{}` specified more than once",
                parameter.code
            )));
        }
        parameters.push(parameter);
    }
    Ok(parameters)
}

/// Validate a single parameter.
///
/// Checks run in order: code present, value present, type recognized,
/// value castable to the type, then the allow-list.
pub fn validate_parameter(input: &ParameterInput) -> TogglyResult<Parameter> {
    if input.code.is_empty() {
        return Err(TogglyError::bad_request("Parameter code not specified"));
    }
    let raw = match &input.value {
        Some(value) if !value.is_null() => value,
        _ => return Err(TogglyError::bad_request("Parameter value not specified")),
    };
    let param_type = input
        .param_type
        .as_deref()
        .and_then(ParameterType::parse)
        .ok_or_else(|| TogglyError::bad_request("Parameter type not specified or wrong"))?;
    let value = cast(param_type, raw)?;

    let allowed_values = match &input.allowed_values {
        Some(allowed) => {
            let allowed = allowed
                .iter()
                .map(|v| cast(param_type, v))
                .collect::<TogglyResult<Vec<_>>>()?;
            if !allowed.contains(&value) {
                return Err(TogglyError::bad_request(format!(
                    "Parameter `{}` value `{}` is not in allowed values",
                    input.code, raw
                )));
            }
            Some(allowed)
        }
        None => None,
    };

    Ok(Parameter {
        code: input.code.clone(),
        description: input.description.clone(),
        value,
        allowed_values,
    })
}

fn cast(param_type: ParameterType, raw: &Value) -> TogglyResult<ParameterValue> {
    ParameterValue::from_json(param_type, raw).ok_or_else(|| {
        TogglyError::bad_request(format!(
            "Can't cast parameter value `{}` to {}",
            raw, param_type
        ))
    })
}
