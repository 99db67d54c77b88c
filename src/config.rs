// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Only watch QuickBuilds in this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Directory holding template overrides for the child manifests
    pub template_dir: Option<PathBuf>,
    /// Delay before a failed reconcile is retried
    pub error_requeue: Duration,
    /// Deadline for a single reconcile pass
    pub reconcile_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespace: None,
            template_dir: None,
            error_requeue: Duration::from_secs(defaults::ERROR_REQUEUE_SECS),
            reconcile_timeout: Duration::from_secs(defaults::RECONCILE_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let error_requeue = match non_empty("ERROR_REQUEUE_SECS") {
            Some(v) => v
                .parse()
                .context("ERROR_REQUEUE_SECS must be a number of seconds")?,
            None => defaults::ERROR_REQUEUE_SECS,
        };
        let reconcile_timeout = match non_empty("RECONCILE_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .context("RECONCILE_TIMEOUT_SECS must be a number of seconds")?,
            None => defaults::RECONCILE_TIMEOUT_SECS,
        };

        Ok(Config {
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            template_dir: non_empty("TEMPLATE_DIR").map(PathBuf::from),
            error_requeue: Duration::from_secs(error_requeue),
            reconcile_timeout: Duration::from_secs(reconcile_timeout),
        })
    }
}
