// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Aggregates the state of the managed children into the QuickBuild status.

use crate::error::{QuickBuildError, Result};
use crate::types::{QuickBuild, QuickBuildStatus};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{Patch, PatchParams},
    Api, Client, ResourceExt,
};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// A Deployment is ready once its controller has reported status and every
/// replica it counts is ready.
pub fn is_deployment_ready(deployment: &Deployment) -> bool {
    deployment.status.as_ref().is_some_and(|s| {
        s.ready_replicas.unwrap_or(0) == s.replicas.unwrap_or(0)
    })
}

/// Cluster IP assigned to a Service, empty until allocated
pub fn service_ip(service: &Service) -> String {
    service
        .spec
        .as_ref()
        .and_then(|s| s.cluster_ip.clone())
        .unwrap_or_default()
}

pub fn compute_status(deployment: &Deployment, service: &Service) -> QuickBuildStatus {
    QuickBuildStatus::new(is_deployment_ready(deployment), service_ip(service))
}

/// Recompute the status of a QuickBuild from its children and write it.
///
/// Nothing is written when either child cannot be found; `Ok(None)` is
/// returned in that case. Lookup and write failures are returned for the
/// caller to log.
#[instrument(skip(client, qb), fields(quickbuild = %format!("{}/{}", qb.namespace().unwrap_or_default(), qb.name_any())))]
pub async fn update_status(client: &Client, qb: &QuickBuild) -> Result<Option<QuickBuildStatus>> {
    let namespace = qb
        .target_namespace()
        .ok_or(QuickBuildError::MissingObjectKey(".spec.namespace"))?;
    let name = qb.target_name();

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
    let Some(deployment) = deployments.get_opt(&name).await? else {
        warn!("Deployment {}/{} not found, leaving status untouched", namespace, name);
        return Ok(None);
    };

    let services: Api<Service> = Api::namespaced(client.clone(), &namespace);
    let Some(service) = services.get_opt(&name).await? else {
        debug!("Service {}/{} not found, leaving status untouched", namespace, name);
        return Ok(None);
    };

    let status = compute_status(&deployment, &service);

    if qb.status.as_ref() == Some(&status) {
        debug!("Status unchanged: {}", status.status);
        return Ok(Some(status));
    }

    let quickbuilds: Api<QuickBuild> = Api::namespaced(
        client.clone(),
        &qb.namespace()
            .ok_or(QuickBuildError::MissingObjectKey(".metadata.namespace"))?,
    );
    let patch = json!({ "status": status });
    quickbuilds
        .patch_status(&qb.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    info!(
        "Status updated: status={} serviceIp={}",
        status.status, status.service_ip
    );
    Ok(Some(status))
}
