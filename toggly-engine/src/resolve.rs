//! Inheritance resolution.
//!
//! An object's effective parameter set is its own declarations merged over
//! the resolved parameters of the object it inherits from. Resolution walks
//! the ancestor chain up to its root first, then folds the merge back down,
//! so arbitrarily deep chains need no recursion and a loop in the chain is
//! reported instead of followed.

use std::collections::HashSet;

use toggly_core::{Object, ObjectRef, OwnerId, Parameter, TogglyError, TogglyResult};
use toggly_storage::DataStorage;

use crate::StorageResultExt;

/// Merge an object's own parameters over its parent's resolved parameters.
///
/// The result holds, in order:
/// 1. every own parameter that overrides a parent parameter, carrying the
///    parent's description and allowed values with the own value;
/// 2. parent parameters that were not overridden;
/// 3. own parameters unknown to the parent.
///
/// An override whose type differs from the parent's fails with
/// [`TogglyError::ObjectInheritorTypeMismatch`].
pub fn merge_parameters(own: &[Parameter], parent: &[Parameter]) -> TogglyResult<Vec<Parameter>> {
    let mut merged: Vec<Parameter> = Vec::with_capacity(own.len() + parent.len());

    for p in own {
        for ip in parent.iter().filter(|ip| ip.code == p.code) {
            if ip.param_type() != p.param_type() {
                return Err(TogglyError::ObjectInheritorTypeMismatch);
            }
            merged.push(Parameter {
                code: ip.code.clone(),
                description: ip.description.clone(),
                value: p.value.clone(),
                allowed_values: ip.allowed_values.clone(),
            });
        }
    }

    for source in [parent, own] {
        for p in source {
            if !merged.iter().any(|m| m.code == p.code) {
                merged.push(p.clone());
            }
        }
    }

    Ok(merged)
}

/// Fetch the stored object a reference points at.
///
/// Each missing link reports its own not-found error, checked top-down.
pub async fn fetch_ref<S>(storage: &S, owner: &OwnerId, target: &ObjectRef) -> TogglyResult<Object>
where
    S: DataStorage + ?Sized,
{
    storage
        .project_get(owner, &target.project_code)
        .await
        .during("project_get")?
        .ok_or(TogglyError::ProjectNotFound)?;

    let project = owner.project(target.project_code.clone());
    storage
        .environment_get(&project, &target.env_code)
        .await
        .during("environment_get")?
        .ok_or(TogglyError::EnvironmentNotFound)?;

    storage
        .object_get(&target.scope(owner), &target.object_code)
        .await
        .during("object_get")?
        .ok_or(TogglyError::ObjectNotFound)
}

/// Resolve a stored object against its ancestor chain.
///
/// Objects without a parent are returned unchanged. A reference seen twice
/// while walking up fails with [`TogglyError::InheritanceCycle`].
pub async fn resolve_object<S>(storage: &S, object: Object) -> TogglyResult<Object>
where
    S: DataStorage + ?Sized,
{
    let mut next = match &object.inherits {
        Some(parent) => Some(parent.clone()),
        None => return Ok(object),
    };

    let origin = object.object_ref();
    let mut visited: HashSet<ObjectRef> = HashSet::from([origin.clone()]);
    let mut path = vec![origin.to_string()];
    // Nearest ancestor first.
    let mut ancestors: Vec<Object> = Vec::new();

    while let Some(target) = next.take() {
        path.push(target.to_string());
        if !visited.insert(target.clone()) {
            return Err(TogglyError::InheritanceCycle { path });
        }
        let ancestor = fetch_ref(storage, &object.owner, &target).await?;
        next = ancestor.inherits.clone();
        ancestors.push(ancestor);
    }

    let mut inherited = match ancestors.pop() {
        Some(root) => root.parameters,
        None => return Ok(object),
    };
    while let Some(ancestor) = ancestors.pop() {
        inherited = merge_parameters(&ancestor.parameters, &inherited)?;
    }

    let parameters = merge_parameters(&object.parameters, &inherited)?;
    Ok(Object { parameters, ..object })
}

/// Whether pointing `object` at `parent` would close a loop.
///
/// Walks the stored chain starting at `parent`. Returns the loop path when it
/// reaches `object`; a missing link or a loop elsewhere ends the walk, since
/// resolution reports those itself.
pub async fn find_cycle<S>(
    storage: &S,
    owner: &OwnerId,
    object: &ObjectRef,
    parent: &ObjectRef,
) -> TogglyResult<Option<Vec<String>>>
where
    S: DataStorage + ?Sized,
{
    let mut path = vec![object.to_string()];
    let mut visited = HashSet::new();
    let mut current = parent.clone();

    loop {
        path.push(current.to_string());
        if &current == object {
            return Ok(Some(path));
        }
        if !visited.insert(current.clone()) {
            return Ok(None);
        }
        let stored = storage
            .object_get(&current.scope(owner), &current.object_code)
            .await
            .during("object_get")?;
        match stored.and_then(|o| o.inherits) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
}
