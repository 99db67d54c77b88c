// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Owner reference handling for managed child objects

use crate::error::{QuickBuildError, Result};
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};

/// Point `child` at `owner` as its controlling owner so the garbage collector
/// removes the child together with the owner.
///
/// An existing reference to the same owner is replaced. Fails when the owner
/// has not been persisted yet (no uid), when a namespaced owner and the child
/// live in different namespaces, or when the child is already controlled by a
/// different object.
pub fn set_owner_reference<K>(owner: &K, child: &mut ObjectMeta) -> Result<()>
where
    K: Resource<DynamicType = ()>,
{
    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        QuickBuildError::OwnerReferenceError(format!(
            "{} {} has no uid",
            K::kind(&()),
            owner.name_any()
        ))
    })?;

    if let Some(owner_namespace) = owner.namespace() {
        if child.namespace.as_deref() != Some(owner_namespace.as_str()) {
            return Err(QuickBuildError::OwnerReferenceError(format!(
                "cross-namespace owner references are disallowed: {} {}/{} cannot own an object in namespace {}",
                K::kind(&()),
                owner_namespace,
                owner.name_any(),
                child.namespace.as_deref().unwrap_or_default()
            )));
        }
    }

    let refs = child.owner_references.get_or_insert_with(Vec::new);

    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(QuickBuildError::OwnerReferenceError(format!(
            "object is already controlled by {} {}",
            other.kind, other.name
        )));
    }

    refs.retain(|r| r.uid != owner_ref.uid);
    refs.push(owner_ref);
    Ok(())
}
