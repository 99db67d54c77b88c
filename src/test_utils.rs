// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking the Kubernetes API server.
//!
//! `MockService` keeps objects in memory keyed by their REST path and answers
//! GET, POST, PUT, DELETE and status PATCH requests the way the API server
//! does for the handful of resources the operator touches.

use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service as CoreService;
use kube::client::Body;
use kube::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

use crate::types::QuickBuild;

#[derive(Default)]
struct ApiState {
    objects: BTreeMap<String, Value>,
    failures: Vec<(String, String, u16)>,
    requests: Vec<(String, String)>,
    resource_version: u64,
    allocated_ips: u8,
}

/// An in-memory API server usable as the transport of a kube `Client`.
#[derive(Clone, Default)]
pub struct MockService {
    state: Arc<Mutex<ApiState>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as if it had been created through the API
    pub fn with_object(self, object: Value) -> Self {
        let path = object_path(&object);
        self.state.lock().unwrap().store(path, object, None);
        self
    }

    /// Fail the next request matching method and exact path with the given status code
    pub fn fail_once(&self, method: &str, path: &str, code: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((method.to_string(), path.to_string(), code));
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// All requests served so far as (method, path)
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests that could have changed state
    pub fn write_count(&self) -> usize {
        self.requests().iter().filter(|(m, _)| m != "GET").count()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.typed(&deployment_path(namespace, name))
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<CoreService> {
        self.typed(&service_path(namespace, name))
    }

    pub fn quickbuild(&self, namespace: &str, name: &str) -> Option<QuickBuild> {
        self.typed(&quickbuild_path(namespace, name))
    }

    /// Report replica counts on a stored Deployment, as the deployment controller would
    pub fn set_deployment_status(&self, namespace: &str, name: &str, replicas: i32, ready: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(obj) = state.objects.get_mut(&deployment_path(namespace, name)) {
            obj["status"] = json!({ "replicas": replicas, "readyReplicas": ready });
        }
    }

    fn typed<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(path)
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }
}

impl ApiState {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    /// Insert or overwrite an object, filling in server-managed fields
    fn store(&mut self, path: String, mut object: Value, previous: Option<&Value>) -> Value {
        let rv = self.next_resource_version();
        let uid = previous
            .and_then(|p| p["metadata"]["uid"].as_str())
            .map(str::to_string)
            .or_else(|| object["metadata"]["uid"].as_str().map(str::to_string))
            .unwrap_or_else(|| format!("uid-{}", rv));
        object["metadata"]["uid"] = json!(uid);
        object["metadata"]["resourceVersion"] = json!(rv);

        if let Some(previous) = previous {
            // The main resource endpoint ignores status
            object["status"] = previous["status"].clone();
            if object["status"].is_null() {
                object.as_object_mut().unwrap().remove("status");
            }
        }

        if object["kind"] == "Service" && object["spec"]["clusterIP"].as_str().is_none() {
            let ip = previous
                .and_then(|p| p["spec"]["clusterIP"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    self.allocated_ips += 1;
                    format!("10.96.0.{}", 9 + self.allocated_ips)
                });
            object["spec"]["clusterIP"] = json!(ip);
        }

        self.objects.insert(path, object.clone());
        object
    }

    fn handle(&mut self, method: &str, path: &str, body: &[u8]) -> (u16, Value) {
        self.requests.push((method.to_string(), path.to_string()));

        if let Some(pos) = self
            .failures
            .iter()
            .position(|(m, p, _)| m == method && p == path)
        {
            let (_, _, code) = self.failures.remove(pos);
            let reason = match code {
                404 => "NotFound",
                409 => "Conflict",
                _ => "InternalError",
            };
            return (code, status_json(code, reason, "injected failure"));
        }

        match method {
            "GET" => match self.objects.get(path) {
                Some(obj) => (200, obj.clone()),
                None => not_found(path),
            },
            "POST" => {
                let object: Value = serde_json::from_slice(body).unwrap();
                let name = object["metadata"]["name"].as_str().unwrap_or_default();
                let key = format!("{}/{}", path, name);
                if self.objects.contains_key(&key) {
                    return (
                        409,
                        status_json(409, "AlreadyExists", &format!("{} already exists", name)),
                    );
                }
                (201, self.store(key, object, None))
            }
            "PUT" => {
                let object: Value = serde_json::from_slice(body).unwrap();
                let Some(previous) = self.objects.get(path).cloned() else {
                    return not_found(path);
                };
                let sent_rv = object["metadata"]["resourceVersion"].as_str();
                if sent_rv.is_some() && sent_rv != previous["metadata"]["resourceVersion"].as_str() {
                    return (
                        409,
                        status_json(409, "Conflict", "the object has been modified"),
                    );
                }
                (200, self.store(path.to_string(), object, Some(&previous)))
            }
            "DELETE" => match self.objects.remove(path) {
                Some(obj) => (200, obj),
                None => not_found(path),
            },
            "PATCH" if path.ends_with("/status") => {
                let key = path.trim_end_matches("/status").to_string();
                let patch: Value = serde_json::from_slice(body).unwrap();
                let rv = self.next_resource_version();
                let Some(obj) = self.objects.get_mut(&key) else {
                    return not_found(path);
                };
                if obj.get("status").is_none() {
                    obj["status"] = json!({});
                }
                merge(&mut obj["status"], &patch["status"]);
                obj["metadata"]["resourceVersion"] = json!(rv);
                (200, obj.clone())
            }
            _ => (
                405,
                status_json(405, "MethodNotAllowed", "unsupported by mock"),
            ),
        }
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let state = self.state.clone();

        Box::pin(async move {
            let body = req.into_body().collect().await?.to_bytes();
            let (status, value) = state.lock().unwrap().handle(&method, &path, &body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))
                .unwrap())
        })
    }
}

/// RFC 7386 JSON merge patch
fn merge(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(entries) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            let target = target.as_object_mut().unwrap();
            for (key, value) in entries {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge(target.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        _ => *target = patch.clone(),
    }
}

fn object_path(object: &Value) -> String {
    let api_version = object["apiVersion"].as_str().unwrap();
    let plural = format!(
        "{}s",
        object["kind"].as_str().unwrap().to_ascii_lowercase()
    );
    let namespace = object["metadata"]["namespace"].as_str().unwrap();
    let name = object["metadata"]["name"].as_str().unwrap();
    let prefix = if api_version.contains('/') {
        format!("/apis/{}", api_version)
    } else {
        format!("/api/{}", api_version)
    };
    format!("{}/namespaces/{}/{}/{}", prefix, namespace, plural, name)
}

pub fn deployment_path(namespace: &str, name: &str) -> String {
    format!("/apis/apps/v1/namespaces/{}/deployments/{}", namespace, name)
}

pub fn service_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/services/{}", namespace, name)
}

pub fn quickbuild_path(namespace: &str, name: &str) -> String {
    format!(
        "/apis/app.mark8s.io/v1/namespaces/{}/quickbuilds/{}",
        namespace, name
    )
}

fn not_found(path: &str) -> (u16, Value) {
    let name = path.rsplit('/').next().unwrap_or_default();
    (404, not_found_json(name))
}

fn status_json(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

/// Create a 404 not found response
pub fn not_found_json(name: &str) -> Value {
    status_json(404, "NotFound", &format!("\"{}\" not found", name))
}

/// Create a QuickBuild JSON object as stored by the API server
pub fn quickbuild_json(
    name: &str,
    namespace: &str,
    target: (&str, &str),
    replicas: Option<i32>,
    enable_service: bool,
) -> Value {
    let mut spec = json!({
        "name": target.0,
        "namespace": target.1,
        "image": "nginx:1.25",
        "port": 8080,
        "enableService": enable_service
    });
    if let Some(replicas) = replicas {
        spec["replicas"] = json!(replicas);
    }
    json!({
        "apiVersion": "app.mark8s.io/v1",
        "kind": "QuickBuild",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("{}-uid", name)
        },
        "spec": spec
    })
}
