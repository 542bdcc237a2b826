//! A representative typed operation surface over [`crate::Client`]+
//! [`kubeasync_core::Request`], scoped to one resource's collection path.
//!
//! A generated client could be generic over a Rust type implementing some
//! `Resource` trait, deriving the URL path and list/watch item type from it
//! at compile time. kubeasync's domain objects are described by the runtime
//! [`kubeasync_core::SchemaRegistry`] instead of per-type structs, so `Api`
//! here is parameterized by a `&'static str` type name and the caller
//! supplies the resource's plural path segment explicitly.
use bytes::Bytes;
use tokio::sync::mpsc::Sender;

use kubeasync_core::params::{ApiOptions, DeleteParams, ListParams, Patch, PatchParams, PostParams, WatchParams};
use kubeasync_core::value::{AttrValue, DomainObject};
use kubeasync_core::{flatten_query, models, serializer, QueryValue, Request as CoreRequest};

use crate::client::Client;
use crate::exec::ExecSession;
use crate::watch::WatchStream;
use crate::{Error, Result};

/// What an `Api` operation handed back, after [`ApiOptions`] is applied.
///
/// Mirrors the generated client's `_preload_content` switch: with
/// `preload_content: false` the caller wants the raw response body, not a
/// value decoded against the schema registry.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    /// The requested object, decoded against the schema registry.
    Object(AttrValue),
    /// A `V1Status` response in place of the requested object (common on
    /// delete/patch errors).
    Status(AttrValue),
    /// The undecoded response body, returned as-is because
    /// [`ApiOptions::without_preload`] was set.
    Raw(String),
}

/// A typed operation surface scoped to one resource collection
/// (`/api/v1/namespaces/{ns}/{plural}` or `/api/v1/{plural}`).
pub struct Api {
    request: CoreRequest,
    client: Client,
    type_name: &'static str,
}

impl Api {
    /// Scope to a namespaced resource's collection in `namespace`.
    pub fn namespaced(client: Client, type_name: &'static str, plural: &str, namespace: &str) -> Self {
        Self {
            request: CoreRequest::new(format!("/api/v1/namespaces/{namespace}/{plural}")),
            client,
            type_name,
        }
    }

    /// Scope to a namespaced resource's collection in the client's default namespace.
    pub fn default_namespaced(client: Client, type_name: &'static str, plural: &str) -> Self {
        let namespace = client.default_namespace().to_string();
        Self::namespaced(client, type_name, plural, &namespace)
    }

    /// Scope to a cluster-scoped resource's collection.
    pub fn all(client: Client, type_name: &'static str, plural: &str) -> Self {
        Self {
            request: CoreRequest::new(format!("/api/v1/{plural}")),
            client,
            type_name,
        }
    }

    /// Fetch a single named instance.
    pub async fn get(&self, name: &str, opts: &ApiOptions) -> Result<ApiResponse> {
        let req = self.request.get(name, opts).map_err(Error::RequestBuild)?;
        self.send_decoded(req, self.type_name, opts).await
    }

    /// List the scoped collection.
    pub async fn list(&self, lp: &ListParams, opts: &ApiOptions) -> Result<ApiResponse> {
        let req = self.request.list(lp, opts).map_err(Error::RequestBuild)?;
        self.send_decoded(req, list_type_name(self.type_name), opts).await
    }

    /// Create a new instance, encoding `obj` against the process-wide schema registry.
    pub async fn create(&self, pp: &PostParams, obj: &DomainObject, opts: &ApiOptions) -> Result<ApiResponse> {
        let wire = serializer::to_wire(&models::REGISTRY, obj).map_err(Error::RequestBuild)?;
        let body = serde_json::to_vec(&wire).map_err(|e| Error::RequestBuild(kubeasync_core::Error::Json(e)))?;
        let req = self.request.create(pp, body, opts).map_err(Error::RequestBuild)?;
        self.send_decoded(req, self.type_name, opts).await
    }

    /// Delete a named instance; the server may answer with either the
    /// deleted object or a `V1Status`.
    pub async fn delete(&self, name: &str, dp: &DeleteParams, opts: &ApiOptions) -> Result<ApiResponse> {
        let req = self.request.delete(name, dp, opts).map_err(Error::RequestBuild)?;
        self.send_decoded_status(req, self.type_name, opts).await
    }

    /// Patch a named instance.
    pub async fn patch(&self, name: &str, pp: &PatchParams, patch: &Patch, opts: &ApiOptions) -> Result<ApiResponse> {
        let req = self.request.patch(name, pp, patch, opts).map_err(Error::RequestBuild)?;
        self.send_decoded_status(req, self.type_name, opts).await
    }

    /// Replace a named instance wholesale; `obj` must carry `metadata.resourceVersion`.
    pub async fn replace(&self, name: &str, pp: &PostParams, obj: &DomainObject, opts: &ApiOptions) -> Result<ApiResponse> {
        let wire = serializer::to_wire(&models::REGISTRY, obj).map_err(Error::RequestBuild)?;
        let body = serde_json::to_vec(&wire).map_err(|e| Error::RequestBuild(kubeasync_core::Error::Json(e)))?;
        let req = self.request.replace(name, pp, body, opts).map_err(Error::RequestBuild)?;
        self.send_decoded(req, self.type_name, opts).await
    }

    /// Watch the scoped collection starting at `resource_version`.
    pub async fn watch(&self, wp: &WatchParams, resource_version: &str, opts: &ApiOptions) -> Result<WatchStream> {
        let req = self.request.watch(wp, resource_version, opts).map_err(Error::RequestBuild)?;
        self.client.request_events(req, self.type_name).await
    }

    /// Send `req`, honoring `opts.preload_content`: the raw body when the
    /// caller opted out of decoding, else the object decoded against
    /// `type_name`.
    async fn send_decoded(&self, req: http::Request<Vec<u8>>, type_name: &'static str, opts: &ApiOptions) -> Result<ApiResponse> {
        if opts.preload_content {
            self.client.request(req, type_name).await.map(ApiResponse::Object)
        } else {
            self.client.request_text(req).await.map(ApiResponse::Raw)
        }
    }

    /// Like [`Self::send_decoded`], but the server may answer with a
    /// `V1Status` instead of `type_name` (delete/patch).
    async fn send_decoded_status(&self, req: http::Request<Vec<u8>>, type_name: &'static str, opts: &ApiOptions) -> Result<ApiResponse> {
        if opts.preload_content {
            match self.client.request_status(req, type_name).await? {
                either::Either::Left(obj) => Ok(ApiResponse::Object(obj)),
                either::Either::Right(status) => Ok(ApiResponse::Status(status)),
            }
        } else {
            self.client.request_text(req).await.map(ApiResponse::Raw)
        }
    }

    /// Open an exec session on a named pod's `exec` subresource.
    pub async fn exec(&self, name: &str, params: &ExecParams) -> Result<ExecSession<hyper_util::rt::TokioIo<hyper::upgrade::Upgraded>>> {
        let query = params.to_query();
        let req = self.request.connect("exec", name, &query).map_err(Error::RequestBuild)?;
        let stream = self.client.connect(req).await?;
        Ok(ExecSession::new(stream))
    }
}

fn list_type_name(type_name: &'static str) -> &'static str {
    match type_name {
        "V1Pod" => "V1PodList",
        "V1Namespace" => "V1NamespaceList",
        other => other,
    }
}

/// Query parameters for an `exec` call.
#[derive(Debug, Clone, Default)]
pub struct ExecParams {
    /// The command (and arguments) to run, as separate `command` query values.
    pub command: Vec<String>,
    /// Attach stdin.
    pub stdin: bool,
    /// Attach stdout.
    pub stdout: bool,
    /// Attach stderr.
    pub stderr: bool,
    /// Allocate a TTY.
    pub tty: bool,
    /// Target a specific container when the pod has more than one.
    pub container: Option<String>,
}

impl ExecParams {
    fn to_query(&self) -> Vec<(String, String)> {
        let command: Vec<&str> = self.command.iter().map(String::as_str).collect();
        let mut pairs = vec![
            ("command", QueryValue::Seq(&command)),
            ("stdin", QueryValue::Bool(self.stdin)),
            ("stdout", QueryValue::Bool(self.stdout)),
            ("stderr", QueryValue::Bool(self.stderr)),
            ("tty", QueryValue::Bool(self.tty)),
        ];
        if let Some(container) = &self.container {
            pairs.push(("container", QueryValue::Str(container)));
        }
        flatten_query(&pairs)
    }
}

/// Forward [`crate::exec::ExecSession::collect`]'s channel-demultiplexed
/// fan-out type, re-exported here since [`ExecParams`]'s callers typically
/// reach for it in the same breath as `exec`.
pub type ChannelSender = Sender<(u8, Bytes)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_params_flatten_command_in_order() {
        let params = ExecParams {
            command: vec!["/bin/sh".into(), "-c".into(), "echo hi".into()],
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let query = params.to_query();
        let commands: Vec<&str> = query.iter().filter(|(k, _)| k == "command").map(|(_, v)| v.as_str()).collect();
        assert_eq!(commands, vec!["/bin/sh", "-c", "echo hi"]);
        assert!(query.contains(&("stdout".to_string(), "true".to_string())));
        assert!(query.contains(&("stdin".to_string(), "false".to_string())));
    }

    #[test]
    fn list_type_name_appends_list_suffix_for_registered_types() {
        assert_eq!(list_type_name("V1Pod"), "V1PodList");
        assert_eq!(list_type_name("V1Namespace"), "V1NamespaceList");
    }
}
