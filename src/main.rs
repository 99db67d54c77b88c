// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quickbuild::config::Config;
use quickbuild::kubernetes::wait_for_quickbuild_crd;
use quickbuild::reconcilers::QuickBuildReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting QuickBuild operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={} template_dir={:?} error_requeue={:?} reconcile_timeout={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.template_dir,
        config.error_requeue,
        config.reconcile_timeout
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for QuickBuild CRD to become available...");
    wait_for_quickbuild_crd(&client).await?;

    let reconciler = QuickBuildReconciler::new(client, config)?;

    info!("Starting reconciler...");
    reconciler.run().await?;

    warn!("QuickBuild reconciler stopped");
    Ok(())
}
