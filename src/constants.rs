// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name, used as field manager and in the managed-by label
pub const OPERATOR_NAME: &str = "quickbuild";

/// Values written to `.status.status` of a QuickBuild
pub mod readiness {
    pub const ALL_READY: &str = "AllReady";
    pub const NOT_READY: &str = "NotReady";
}

/// Child manifest templates
pub mod templates {
    pub const DEPLOYMENT: &str = "deployment.yaml.tera";
    pub const SERVICE: &str = "service.yaml.tera";
}

/// CRD polling configuration
pub mod crd {
    /// API group served by the QuickBuild CRD
    pub const GROUP: &str = "app.mark8s.io";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Defaults for settings read from the environment
pub mod defaults {
    pub const ERROR_REQUEUE_SECS: u64 = 60;
    pub const RECONCILE_TIMEOUT_SECS: u64 = 30;
}
