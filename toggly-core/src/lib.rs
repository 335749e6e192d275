//! Toggly Core - Domain Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! Projects own Environments, Environments own Objects, Objects carry typed
//! Parameters and may inherit from another Object of the same owner.

pub mod error;
pub mod parameter;

pub use error::{
    CacheError, ConfigError, EntityKind, ErrorCode, StorageError, TogglyError, TogglyResult,
};
pub use parameter::{Parameter, ParameterInput, ParameterType, ParameterValue};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// CODE TYPES
// ============================================================================

macro_rules! define_code {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_string())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_code!(
    /// Tenant identifier scoping every project.
    OwnerId
);
define_code!(
    /// Project code, unique per owner.
    ProjectCode
);
define_code!(
    /// Environment code, unique per project.
    EnvironmentCode
);
define_code!(
    /// Object code, unique per environment.
    ObjectCode
);
define_code!(
    /// Parameter code, unique within its object.
    ParameterCode
);

// ============================================================================
// SCOPES
// ============================================================================

impl OwnerId {
    /// Narrow this owner down to one of its projects.
    pub fn project(&self, project: impl Into<ProjectCode>) -> ProjectScope {
        ProjectScope {
            owner: self.clone(),
            project: project.into(),
        }
    }
}

/// A project of a given owner. Environments live inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectScope {
    pub owner: OwnerId,
    pub project: ProjectCode,
}

impl ProjectScope {
    pub fn new(owner: impl Into<OwnerId>, project: impl Into<ProjectCode>) -> Self {
        Self {
            owner: owner.into(),
            project: project.into(),
        }
    }

    /// Narrow this project down to one of its environments.
    pub fn environment(&self, environment: impl Into<EnvironmentCode>) -> EnvironmentScope {
        EnvironmentScope {
            owner: self.owner.clone(),
            project: self.project.clone(),
            environment: environment.into(),
        }
    }
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.project)
    }
}

/// An environment of a given project. Objects live inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentScope {
    pub owner: OwnerId,
    pub project: ProjectCode,
    pub environment: EnvironmentCode,
}

impl EnvironmentScope {
    pub fn new(
        owner: impl Into<OwnerId>,
        project: impl Into<ProjectCode>,
        environment: impl Into<EnvironmentCode>,
    ) -> Self {
        Self {
            owner: owner.into(),
            project: project.into(),
            environment: environment.into(),
        }
    }

    /// The enclosing project scope.
    pub fn project_scope(&self) -> ProjectScope {
        ProjectScope {
            owner: self.owner.clone(),
            project: self.project.clone(),
        }
    }

    /// Reference to an object living in this environment.
    pub fn object_ref(&self, code: impl Into<ObjectCode>) -> ObjectRef {
        ObjectRef {
            project_code: self.project.clone(),
            env_code: self.environment.clone(),
            object_code: code.into(),
        }
    }
}

impl fmt::Display for EnvironmentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.owner, self.project, self.environment)
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Project status. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Disabled,
}

/// A project owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "owner")]
    pub owner_id: OwnerId,
    pub code: ProjectCode,
    pub description: String,
    #[serde(rename = "reg_date")]
    pub registered_at: Timestamp,
    pub status: ProjectStatus,
}

impl Project {
    pub fn scope(&self) -> ProjectScope {
        ProjectScope {
            owner: self.owner_id.clone(),
            project: self.code.clone(),
        }
    }
}

/// An environment inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(rename = "owner")]
    pub owner_id: OwnerId,
    pub project_code: ProjectCode,
    pub code: EnvironmentCode,
    pub description: String,
    pub protected: bool,
    #[serde(rename = "reg_date")]
    pub registered_at: Timestamp,
}

impl Environment {
    pub fn scope(&self) -> EnvironmentScope {
        EnvironmentScope {
            owner: self.owner_id.clone(),
            project: self.project_code.clone(),
            environment: self.code.clone(),
        }
    }
}

/// Pointer to an object of the same owner, possibly in another project or
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub project_code: ProjectCode,
    pub env_code: EnvironmentCode,
    pub object_code: ObjectCode,
}

impl ObjectRef {
    pub fn new(
        project_code: impl Into<ProjectCode>,
        env_code: impl Into<EnvironmentCode>,
        object_code: impl Into<ObjectCode>,
    ) -> Self {
        Self {
            project_code: project_code.into(),
            env_code: env_code.into(),
            object_code: object_code.into(),
        }
    }

    /// Environment scope the referenced object lives in.
    pub fn scope(&self, owner: &OwnerId) -> EnvironmentScope {
        EnvironmentScope {
            owner: owner.clone(),
            project: self.project_code.clone(),
            environment: self.env_code.clone(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project_code, self.env_code, self.object_code)
    }
}

/// A configuration object. As stored, `parameters` holds only the object's
/// own declarations; services return it with the inheritance chain merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub owner: OwnerId,
    pub project_code: ProjectCode,
    pub env_code: EnvironmentCode,
    pub code: ObjectCode,
    pub description: String,
    pub inherits: Option<ObjectRef>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Object {
    pub fn scope(&self) -> EnvironmentScope {
        EnvironmentScope {
            owner: self.owner.clone(),
            project: self.project_code.clone(),
            environment: self.env_code.clone(),
        }
    }

    /// Reference other objects use to inherit from this one.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            project_code: self.project_code.clone(),
            env_code: self.env_code.clone(),
            object_code: self.code.clone(),
        }
    }

    /// Find a parameter by code.
    pub fn parameter(&self, code: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.code.as_str() == code)
    }
}

// ============================================================================
// WRITE PAYLOADS
// ============================================================================

/// Payload for project create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub code: ProjectCode,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl ProjectInfo {
    pub fn new(code: impl Into<ProjectCode>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }
}

/// Payload for environment create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub code: EnvironmentCode,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protected: bool,
}

impl EnvironmentInfo {
    pub fn new(code: impl Into<EnvironmentCode>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }
}

/// Payload for object create/update. Parameters arrive unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub code: ObjectCode,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inherits: Option<ObjectRef>,
    #[serde(default)]
    pub parameters: Vec<ParameterInput>,
}

impl ObjectInfo {
    pub fn new(code: impl Into<ObjectCode>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inherits(mut self, parent: ObjectRef) -> Self {
        self.inherits = Some(parent);
        self
    }

    pub fn parameter(mut self, parameter: ParameterInput) -> Self {
        self.parameters.push(parameter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_builders() {
        let owner = OwnerId::new("ow1");
        let env = owner.project("project1").environment("env1");
        assert_eq!(env.owner.as_str(), "ow1");
        assert_eq!(env.project.as_str(), "project1");
        assert_eq!(env.environment.as_str(), "env1");
        assert_eq!(env.project_scope(), ProjectScope::new("ow1", "project1"));
        assert_eq!(env.to_string(), "ow1:project1:env1");
    }

    #[test]
    fn test_object_ref_points_back_to_scope() {
        let env = EnvironmentScope::new("ow1", "p", "e");
        let r = env.object_ref("obj1");
        assert_eq!(r, ObjectRef::new("p", "e", "obj1"));
        assert_eq!(r.scope(&OwnerId::new("ow1")), env);
        assert_eq!(r.to_string(), "p:e:obj1");
    }

    #[test]
    fn test_project_serializes_with_wire_names() {
        let project = Project {
            owner_id: OwnerId::new("ow1"),
            code: ProjectCode::new("p1"),
            description: String::new(),
            registered_at: Utc::now(),
            status: ProjectStatus::Disabled,
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["owner"], "ow1");
        assert_eq!(json["code"], "p1");
        assert_eq!(json["status"], "disabled");
        assert!(json.get("reg_date").is_some());
    }

    #[test]
    fn test_object_info_builder() {
        let info = ObjectInfo::new("obj2")
            .with_description("child")
            .inherits(ObjectRef::new("p", "e", "obj1"))
            .parameter(ParameterInput::bool("flag", true));
        assert_eq!(info.code.as_str(), "obj2");
        assert_eq!(info.parameters.len(), 1);
        assert_eq!(
            info.inherits.as_ref().map(|r| r.object_code.as_str()),
            Some("obj1")
        );
    }
}
