//! Error types for Toggly operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Entity kind discriminator used in storage diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Project,
    Environment,
    Object,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Storage layer errors.
///
/// `NotFound` and `UniqueIndex` are the two sentinels the engine reacts to;
/// everything else is an internal failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    #[error("Unique index error: {entity} [{key}]")]
    UniqueIndex { entity: EntityKind, key: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for the expected outcomes the engine maps to typed errors.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UniqueIndex { .. })
    }
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },
}

/// Master error type for all Toggly errors.
///
/// Every variant except `Storage`, `Cache` and `Config` is an expected,
/// client-facing outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TogglyError {
    #[error("Project not found")]
    ProjectNotFound,

    #[error("Project not empty")]
    ProjectNotEmpty,

    #[error("Environment not found")]
    EnvironmentNotFound,

    #[error("Environment not empty")]
    EnvironmentNotEmpty,

    #[error("Object not found")]
    ObjectNotFound,

    #[error("Object has inheritors")]
    ObjectHasInheritors,

    #[error("Object parent does not exist")]
    ObjectParentNotExists,

    #[error("Object inheritor parameter type mismatch")]
    ObjectInheritorTypeMismatch,

    #[error("Object inheritance cycle: {}", .path.join(" -> "))]
    InheritanceCycle { path: Vec<String> },

    #[error("Object parameter `{name}` error: {reason}")]
    ObjectParameter { name: String, reason: String },

    #[error("Bad request: {reason}")]
    BadRequest { reason: String },

    #[error("Unique index error: {entity} [{key}]")]
    UniqueIndex { entity: EntityKind, key: String },

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl TogglyError {
    /// Create a BadRequest error.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    /// Create a named parameter error.
    pub fn object_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ObjectParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ProjectNotFound => ErrorCode::ProjectNotFound,
            Self::ProjectNotEmpty => ErrorCode::ProjectNotEmpty,
            Self::EnvironmentNotFound => ErrorCode::EnvironmentNotFound,
            Self::EnvironmentNotEmpty => ErrorCode::EnvironmentNotEmpty,
            Self::ObjectNotFound => ErrorCode::ObjectNotFound,
            Self::ObjectHasInheritors => ErrorCode::ObjectHasInheritors,
            Self::ObjectParentNotExists => ErrorCode::ObjectParentNotExists,
            Self::ObjectInheritorTypeMismatch => ErrorCode::ObjectInheritorTypeMismatch,
            Self::InheritanceCycle { .. } => ErrorCode::InheritanceCycle,
            Self::ObjectParameter { .. } => ErrorCode::ObjectParameter,
            Self::BadRequest { .. } => ErrorCode::BadRequest,
            Self::UniqueIndex { .. } => ErrorCode::UniqueIndex,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Cache(_) => ErrorCode::CacheError,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        self.code().status_code()
    }

    /// True for failures unrelated to the caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Cache(_) | Self::Config(_))
    }
}

impl From<StorageError> for TogglyError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueIndex { entity, key } => Self::UniqueIndex { entity, key },
            other => Self::Storage(other),
        }
    }
}

/// Result type alias for Toggly operations.
pub type TogglyResult<T> = Result<T, TogglyError>;

// ============================================================================
// ERROR CODES
// ============================================================================

/// Stable error codes exposed to transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation / conflict (400)
    BadRequest,
    UniqueIndex,
    ObjectParameter,
    ObjectParentNotExists,
    ObjectInheritorTypeMismatch,
    InheritanceCycle,

    // Not found (404)
    ProjectNotFound,
    EnvironmentNotFound,
    ObjectNotFound,

    // State conflict (409)
    ProjectNotEmpty,
    EnvironmentNotEmpty,

    // Locked by dependents (423)
    ObjectHasInheritors,

    // Internal (500)
    StorageError,
    CacheError,
    ConfigError,
}

impl ErrorCode {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::BadRequest
            | ErrorCode::UniqueIndex
            | ErrorCode::ObjectParameter
            | ErrorCode::ObjectParentNotExists
            | ErrorCode::ObjectInheritorTypeMismatch
            | ErrorCode::InheritanceCycle => 400,

            ErrorCode::ProjectNotFound
            | ErrorCode::EnvironmentNotFound
            | ErrorCode::ObjectNotFound => 404,

            ErrorCode::ProjectNotEmpty | ErrorCode::EnvironmentNotEmpty => 409,

            ErrorCode::ObjectHasInheritors => 423,

            ErrorCode::StorageError | ErrorCode::CacheError | ErrorCode::ConfigError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
