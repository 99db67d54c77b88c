// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::readiness;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// Desired state of an application bundle: one Deployment and an optional Service.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "app.mark8s.io", version = "v1", kind = "QuickBuild")]
#[kube(namespaced)]
#[kube(status = "QuickBuildStatus")]
#[kube(shortname = "qb")]
#[kube(
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Service-IP", "type":"string", "jsonPath":".status.serviceIp"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct QuickBuildSpec {
    /// Name of the Deployment and Service to manage
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[schemars(length(max = 50))]
    pub name: String,
    /// Namespace of the Deployment and Service to manage
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[schemars(length(max = 64))]
    pub namespace: String,
    /// Container image
    #[serde(default)]
    pub image: String,
    /// Port the container listens on
    #[schemars(range(min = 1))]
    pub port: i32,
    /// Number of replicas; the platform default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub replicas: Option<i32>,
    /// Whether a Service should expose the Deployment
    #[serde(default)]
    pub enable_service: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuickBuildStatus {
    /// `AllReady` or `NotReady`
    #[serde(default)]
    pub status: String,
    /// Cluster IP of the managed Service
    #[serde(default)]
    pub service_ip: String,
}

impl QuickBuildStatus {
    pub fn new(all_ready: bool, service_ip: impl Into<String>) -> Self {
        let status = if all_ready {
            readiness::ALL_READY
        } else {
            readiness::NOT_READY
        };
        Self {
            status: status.to_string(),
            service_ip: service_ip.into(),
        }
    }

    pub fn is_all_ready(&self) -> bool {
        self.status == readiness::ALL_READY
    }
}

impl QuickBuild {
    /// Name of the managed children, falling back to the QuickBuild's own name
    pub fn target_name(&self) -> String {
        if self.spec.name.is_empty() {
            self.name_any()
        } else {
            self.spec.name.clone()
        }
    }

    /// Namespace of the managed children, falling back to the QuickBuild's own namespace
    pub fn target_namespace(&self) -> Option<String> {
        if self.spec.namespace.is_empty() {
            self.namespace()
        } else {
            Some(self.spec.namespace.clone())
        }
    }

    /// Get the current readiness, empty until the first status write
    pub fn readiness(&self) -> &str {
        self.status.as_ref().map(|s| s.status.as_str()).unwrap_or_default()
    }
}
