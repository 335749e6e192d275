//! Hierarchical cache keys.
//!
//! `CacheKey` can only be built from an owner or a scope handle, so every
//! key is tenant-prefixed by construction:
//!
//! ```text
//! /own/{owner}/project
//! /own/{owner}/project/{project}
//! /own/{owner}/project/{project}/env
//! /own/{owner}/project/{project}/env/{env}
//! /own/{owner}/project/{project}/env/{env}/object
//! /own/{owner}/project/{project}/env/{env}/object/{object}
//! ```
//!
//! Codes are percent-encoded, so a `/` inside a code never crosses into
//! another key's path.

use std::borrow::Cow;
use std::fmt;

use toggly_core::{EnvironmentCode, EnvironmentScope, ObjectCode, OwnerId, ProjectCode, ProjectScope};

/// A cache key identifying a cached list or single-entity response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    path: String,
}

fn segment(code: &impl AsRef<str>) -> Cow<'_, str> {
    urlencoding::encode(code.as_ref())
}

impl CacheKey {
    /// Key of the owner's project list.
    pub fn project_list(owner: &OwnerId) -> Self {
        Self {
            path: format!("/own/{}/project", segment(owner)),
        }
    }

    /// Key of a single project.
    pub fn project(owner: &OwnerId, code: &ProjectCode) -> Self {
        Self {
            path: format!("/own/{}/project/{}", segment(owner), segment(code)),
        }
    }

    /// Key of a project's environment list.
    pub fn environment_list(scope: &ProjectScope) -> Self {
        Self {
            path: format!(
                "/own/{}/project/{}/env",
                segment(&scope.owner),
                segment(&scope.project)
            ),
        }
    }

    /// Key of a single environment.
    pub fn environment(scope: &ProjectScope, code: &EnvironmentCode) -> Self {
        Self {
            path: format!(
                "/own/{}/project/{}/env/{}",
                segment(&scope.owner),
                segment(&scope.project),
                segment(code)
            ),
        }
    }

    /// Key of an environment's object list.
    pub fn object_list(scope: &EnvironmentScope) -> Self {
        Self {
            path: format!(
                "/own/{}/project/{}/env/{}/object",
                segment(&scope.owner),
                segment(&scope.project),
                segment(&scope.environment)
            ),
        }
    }

    /// Key of a single (resolved) object.
    pub fn object(scope: &EnvironmentScope, code: &ObjectCode) -> Self {
        Self {
            path: format!(
                "/own/{}/project/{}/env/{}/object/{}",
                segment(&scope.owner),
                segment(&scope.project),
                segment(&scope.environment),
                segment(code)
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.path
    }
}
