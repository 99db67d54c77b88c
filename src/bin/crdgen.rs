// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prints the QuickBuild CustomResourceDefinition as YAML.

use kube::CustomResourceExt;
use quickbuild::types::QuickBuild;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&QuickBuild::crd())?);
    Ok(())
}
