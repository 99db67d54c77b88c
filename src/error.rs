// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuickBuildError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Failed to read template {path}: {source}")]
    TemplateIoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Rendered manifest is invalid: {0}")]
    ManifestError(#[from] serde_yaml::Error),

    #[error("Cannot set owner reference: {0}")]
    OwnerReferenceError(String),

    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),

    #[error("Reconcile did not finish within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, QuickBuildError>;

/// True when the API server answered 404 NotFound
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

/// True when a create raced with another writer and lost (409 AlreadyExists)
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists")
}
