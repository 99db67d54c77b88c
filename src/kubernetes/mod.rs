// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and owner references.

pub mod crd;
pub mod owner;

pub use crd::wait_for_quickbuild_crd;
pub use owner::set_owner_reference;
