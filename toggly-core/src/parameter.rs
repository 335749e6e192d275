//! Parameter types
//!
//! A stored [`Parameter`] carries a [`ParameterValue`] tagged union, so its
//! type is always the type of its value. Writes arrive as [`ParameterInput`],
//! the loosely typed shape a transport hands over, and are validated into
//! parameters by the engine.

use crate::ParameterCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Parameter type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Bool,
    Int,
    String,
}

impl ParameterType {
    /// Parse a wire type name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-tagged parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl ParameterValue {
    pub fn param_type(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Int(_) => ParameterType::Int,
            Self::String(_) => ParameterType::String,
        }
    }

    /// Cast a JSON value to the given type. Returns `None` when the shape
    /// does not match.
    pub fn from_json(param_type: ParameterType, value: &Value) -> Option<Self> {
        match param_type {
            ParameterType::Bool => value.as_bool().map(Self::Bool),
            ParameterType::Int => value.as_i64().map(Self::Int),
            ParameterType::String => value.as_str().map(|s| Self::String(s.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::String(v) => Value::String(v.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// A validated, typed parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub code: ParameterCode,
    #[serde(default)]
    pub description: String,
    pub value: ParameterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<ParameterValue>>,
}

impl Parameter {
    pub fn new(code: impl Into<ParameterCode>, value: impl Into<ParameterValue>) -> Self {
        Self {
            code: code.into(),
            description: String::new(),
            value: value.into(),
            allowed_values: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn param_type(&self) -> ParameterType {
        self.value.param_type()
    }
}

/// Unvalidated parameter as received from a caller.
///
/// Any field may be missing or of the wrong shape; validation rejects those
/// with a bad-request error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterInput {
    #[serde(default)]
    pub code: ParameterCode,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl ParameterInput {
    /// Input with an arbitrary type name and JSON value.
    pub fn raw(code: impl Into<ParameterCode>, param_type: impl Into<String>, value: Value) -> Self {
        Self {
            code: code.into(),
            description: String::new(),
            param_type: Some(param_type.into()),
            value: Some(value),
            allowed_values: None,
        }
    }

    pub fn bool(code: impl Into<ParameterCode>, value: bool) -> Self {
        Self::raw(code, ParameterType::Bool.as_str(), Value::Bool(value))
    }

    pub fn int(code: impl Into<ParameterCode>, value: i64) -> Self {
        Self::raw(code, ParameterType::Int.as_str(), Value::from(value))
    }

    pub fn string(code: impl Into<ParameterCode>, value: impl Into<String>) -> Self {
        Self::raw(code, ParameterType::String.as_str(), Value::String(value.into()))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_allowed_values(mut self, allowed: Vec<Value>) -> Self {
        self.allowed_values = Some(allowed);
        self
    }
}

impl From<&Parameter> for ParameterInput {
    fn from(p: &Parameter) -> Self {
        Self {
            code: p.code.clone(),
            description: p.description.clone(),
            param_type: Some(p.param_type().as_str().to_string()),
            value: Some(p.value.to_json()),
            allowed_values: p
                .allowed_values
                .as_ref()
                .map(|values| values.iter().map(ParameterValue::to_json).collect()),
        }
    }
}
