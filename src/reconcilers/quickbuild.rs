// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! QuickBuild reconciler - keeps the Deployment and optional Service of each
//! QuickBuild in line with its spec and reports their state back.

use crate::config::Config;
use crate::error::{is_already_exists, is_not_found, QuickBuildError, Result};
use crate::kubernetes::set_owner_reference;
use crate::reconcilers::status::update_status;
use crate::render::Renderer;
use crate::types::QuickBuild;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{DeleteParams, ObjectMeta, PostParams},
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct QuickBuildReconciler {
    client: Client,
    renderer: Renderer,
    config: Config,
}

impl QuickBuildReconciler {
    pub fn new(client: Client, config: Config) -> Result<Self> {
        let renderer = Renderer::with_template_dir(config.template_dir.as_deref())?;
        Ok(Self {
            client,
            renderer,
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        // Children share their owner's namespace, so they are watched with the same scope
        let (quickbuilds, deployments, services): (Api<QuickBuild>, Api<Deployment>, Api<Service>) =
            match &self.config.watch_namespace {
                Some(namespace) => (
                    Api::namespaced(self.client.clone(), namespace),
                    Api::namespaced(self.client.clone(), namespace),
                    Api::namespaced(self.client.clone(), namespace),
                ),
                None => (
                    Api::all(self.client.clone()),
                    Api::all(self.client.clone()),
                    Api::all(self.client.clone()),
                ),
            };
        let context = Arc::new(self);

        Controller::new(quickbuilds, WatcherConfig::default())
            .owns(deployments, WatcherConfig::default())
            .owns(services, WatcherConfig::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled quickbuild: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Reconcile one QuickBuild, giving up once the configured deadline passes.
    /// Dropping the pass cancels any request still in flight.
    pub async fn reconcile_with_deadline(&self, namespace: &str, name: &str) -> Result<Action> {
        let deadline = self.config.reconcile_timeout;
        tokio::time::timeout(deadline, self.reconcile_quickbuild(namespace, name))
            .await
            .map_err(|_| QuickBuildError::Timeout(deadline))?
    }

    /// One idempotent pass over a QuickBuild identified by namespace and name.
    #[instrument(skip(self), fields(quickbuild = %format!("{}/{}", namespace, name)))]
    pub async fn reconcile_quickbuild(&self, namespace: &str, name: &str) -> Result<Action> {
        let quickbuilds: Api<QuickBuild> = Api::namespaced(self.client.clone(), namespace);

        // Deleted in the meantime; the garbage collector removes the children
        let Some(qb) = quickbuilds.get_opt(name).await? else {
            debug!("QuickBuild no longer exists, nothing to do");
            return Ok(Action::await_change());
        };

        let target_namespace = qb
            .target_namespace()
            .ok_or(QuickBuildError::MissingObjectKey(".spec.namespace"))?;
        let target_name = qb.target_name();

        self.reconcile_deployment(&qb, &target_namespace, &target_name)
            .await?;
        self.reconcile_service(&qb, &target_namespace, &target_name)
            .await?;

        match update_status(&self.client, &qb).await {
            Ok(Some(status)) => debug!("QuickBuild status is {}", status.status),
            Ok(None) => debug!("Status not computable yet"),
            Err(e) => error!("Failed to update status: {}", e),
        }

        Ok(Action::await_change())
    }

    async fn reconcile_deployment(&self, qb: &QuickBuild, namespace: &str, name: &str) -> Result<()> {
        let mut desired = self.renderer.deployment(qb)?;
        pin_identity(&mut desired.metadata, namespace, name);

        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);

        match deployments.get_opt(name).await? {
            None => {
                set_owner_reference(qb, &mut desired.metadata)?;
                create_child(&deployments, &desired, "Deployment", namespace, name).await
            }
            Some(existing) => {
                // Owners recorded on the live object are kept, a foreign controller is rejected
                desired.metadata.owner_references = existing.metadata.owner_references;
                set_owner_reference(qb, &mut desired.metadata)?;
                // Full overwrite on every pass, guarded by the observed version
                desired.metadata.resource_version = existing.metadata.resource_version;
                deployments
                    .replace(name, &PostParams::default(), &desired)
                    .await?;
                info!("Updated Deployment {}/{}", namespace, name);
                Ok(())
            }
        }
    }

    async fn reconcile_service(&self, qb: &QuickBuild, namespace: &str, name: &str) -> Result<()> {
        let mut desired = self.renderer.service(qb)?;
        pin_identity(&mut desired.metadata, namespace, name);
        set_owner_reference(qb, &mut desired.metadata)?;

        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let enabled = qb.spec.enable_service;

        match services.get_opt(name).await? {
            None if enabled => create_child(&services, &desired, "Service", namespace, name).await,
            None => {
                debug!("Service {}/{} disabled and absent", namespace, name);
                Ok(())
            }
            Some(mut existing) if enabled => {
                // Only the port mapping is ours; clusterIP and friends stay as allocated
                let ports = desired.spec.and_then(|s| s.ports);
                existing.spec.get_or_insert_with(Default::default).ports = ports;
                set_owner_reference(qb, &mut existing.metadata)?;
                services
                    .replace(name, &PostParams::default(), &existing)
                    .await?;
                info!("Updated ports of Service {}/{}", namespace, name);
                Ok(())
            }
            Some(_) => match services.delete(name, &DeleteParams::default()).await {
                Ok(_) => {
                    info!("Deleted disabled Service {}/{}", namespace, name);
                    Ok(())
                }
                Err(e) if is_not_found(&e) => {
                    debug!("Service {}/{} already gone", namespace, name);
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}

/// Children always live at the identity derived from the QuickBuild,
/// whatever the template says.
fn pin_identity(meta: &mut ObjectMeta, namespace: &str, name: &str) {
    meta.name = Some(name.to_string());
    meta.namespace = Some(namespace.to_string());
}

async fn create_child<K>(api: &Api<K>, child: &K, kind: &str, namespace: &str, name: &str) -> Result<()>
where
    K: Clone + DeserializeOwned + Serialize + Debug,
{
    match api.create(&PostParams::default(), child).await {
        Ok(_) => {
            info!("Created {} {}/{}", kind, namespace, name);
            Ok(())
        }
        Err(e) if is_already_exists(&e) => {
            debug!("{} {}/{} was created concurrently", kind, namespace, name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn reconcile(qb: Arc<QuickBuild>, ctx: Arc<QuickBuildReconciler>) -> Result<Action> {
    let namespace = qb
        .namespace()
        .ok_or(QuickBuildError::MissingObjectKey(".metadata.namespace"))?;

    ctx.reconcile_with_deadline(&namespace, &qb.name_any()).await
}

fn error_policy(
    _qb: Arc<QuickBuild>,
    error: &QuickBuildError,
    ctx: Arc<QuickBuildReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.config.error_requeue)
}
