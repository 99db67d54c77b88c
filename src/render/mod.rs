// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Renders the desired Deployment and Service for a QuickBuild from Tera templates.
//!
//! Templates are embedded at compile time. A template directory may override
//! any of them by providing a file with the same name.

use crate::constants::{templates, OPERATOR_NAME};
use crate::error::{QuickBuildError, Result};
use crate::types::QuickBuild;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};
use tracing::{debug, info};

const EMBEDDED: &[(&str, &str)] = &[
    (
        templates::DEPLOYMENT,
        include_str!("templates/deployment.yaml.tera"),
    ),
    (templates::SERVICE, include_str!("templates/service.yaml.tera")),
];

/// The kinds of child object a QuickBuild owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Deployment,
    Service,
}

impl TemplateKind {
    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::Deployment => templates::DEPLOYMENT,
            TemplateKind::Service => templates::SERVICE,
        }
    }
}

/// Values exposed to the templates
#[derive(Serialize)]
struct RenderContext<'a> {
    name: String,
    namespace: String,
    image: &'a str,
    port: i32,
    replicas: Option<i32>,
    managed_by: &'static str,
}

impl<'a> RenderContext<'a> {
    fn from_quickbuild(qb: &'a QuickBuild) -> Result<Self> {
        let namespace = qb
            .target_namespace()
            .ok_or(QuickBuildError::MissingObjectKey(".spec.namespace"))?;

        Ok(Self {
            name: qb.target_name(),
            namespace,
            image: &qb.spec.image,
            port: qb.spec.port,
            replicas: qb.spec.replicas,
            managed_by: OPERATOR_NAME,
        })
    }
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Build a renderer from the embedded templates only
    pub fn new() -> Result<Self> {
        Self::with_template_dir(None)
    }

    /// Build a renderer, letting files in `dir` replace the embedded templates
    pub fn with_template_dir(dir: Option<&Path>) -> Result<Self> {
        let mut sources = Vec::with_capacity(EMBEDDED.len());

        for (name, embedded) in EMBEDDED {
            let source = match dir.map(|d| d.join(name)).filter(|p| p.is_file()) {
                Some(path) => {
                    info!("Using template override {}", path.display());
                    std::fs::read_to_string(&path)
                        .map_err(|source| QuickBuildError::TemplateIoError { path, source })?
                }
                None => (*embedded).to_string(),
            };
            sources.push((*name, source));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;
        Ok(Self { tera })
    }

    /// Render the manifest of the given kind for a QuickBuild
    pub fn render(&self, kind: TemplateKind, qb: &QuickBuild) -> Result<String> {
        let ctx = Context::from_serialize(RenderContext::from_quickbuild(qb)?)?;
        let rendered = self.tera.render(kind.template_name(), &ctx)?;
        debug!("Rendered {:?} manifest:\n{}", kind, rendered);
        Ok(rendered)
    }

    /// Desired Deployment for a QuickBuild, without owner references
    pub fn deployment(&self, qb: &QuickBuild) -> Result<Deployment> {
        let manifest = self.render(TemplateKind::Deployment, qb)?;
        Ok(serde_yaml::from_str(&manifest)?)
    }

    /// Desired Service for a QuickBuild, without owner references
    pub fn service(&self, qb: &QuickBuild) -> Result<Service> {
        let manifest = self.render(TemplateKind::Service, qb)?;
        Ok(serde_yaml::from_str(&manifest)?)
    }
}
