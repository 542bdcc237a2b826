//! Builds `http::Request<Vec<u8>>` values for a resource's URL path.
//!
//! Pure and side-effect-free: no connection is touched here. A
//! [`crate::value::DomainObject`] is turned into request bytes by the
//! caller with [`crate::serializer::to_wire`] before reaching [`create`]/
//! [`Request::replace`]; this module only shapes the HTTP envelope.
use crate::error::{Error, Result};
use crate::params::{ApiOptions, DeleteParams, ListParams, Patch, PatchParams, PostParams, WatchParams};

const JSON_MIME: &str = "application/json";

/// A request builder scoped to one resource's URL path
/// (e.g. `/api/v1/namespaces/default/pods`).
#[derive(Debug, Clone)]
pub struct Request {
    /// The path component of a url, with no trailing slash.
    pub url_path: String,
}

impl Request {
    /// Start a request builder for `url_path`.
    pub fn new(url_path: impl Into<String>) -> Self {
        Self {
            url_path: url_path.into(),
        }
    }

    /// List a collection.
    pub fn list(&self, lp: &ListParams, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}?", self.url_path));
        lp.populate_qp(&mut qp);
        opts.populate_qp(&mut qp);
        build(http::Request::get(qp.finish()), vec![])
    }

    /// Watch a collection starting at `resource_version`.
    pub fn watch(&self, wp: &WatchParams, resource_version: &str, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        wp.validate()?;
        let mut qp = form_urlencoded::Serializer::new(format!("{}?", self.url_path));
        wp.populate_qp(&mut qp);
        qp.append_pair("resourceVersion", resource_version);
        opts.populate_qp(&mut qp);
        build(http::Request::get(qp.finish()), vec![])
    }

    /// Get a single named instance.
    pub fn get(&self, name: &str, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}/{}?", self.url_path, name));
        opts.populate_qp(&mut qp);
        build(http::Request::get(qp.finish()), vec![])
    }

    /// Create an instance, `body` already encoded via [`crate::serializer::to_wire`].
    pub fn create(&self, pp: &PostParams, body: Vec<u8>, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}?", self.url_path));
        pp.populate_qp(&mut qp);
        opts.populate_qp(&mut qp);
        build(
            http::Request::post(qp.finish()).header(http::header::CONTENT_TYPE, JSON_MIME),
            body,
        )
    }

    /// Delete a named instance.
    pub fn delete(&self, name: &str, dp: &DeleteParams, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}/{}?", self.url_path, name));
        opts.populate_qp(&mut qp);
        build(
            http::Request::delete(qp.finish()).header(http::header::CONTENT_TYPE, JSON_MIME),
            dp.body(),
        )
    }

    /// Delete every instance in the collection matching `lp`'s selectors.
    pub fn delete_collection(&self, dp: &DeleteParams, lp: &ListParams) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}?", self.url_path));
        if let Some(fields) = &lp.field_selector {
            qp.append_pair("fieldSelector", fields);
        }
        if let Some(labels) = &lp.label_selector {
            qp.append_pair("labelSelector", labels);
        }
        build(
            http::Request::delete(qp.finish()).header(http::header::CONTENT_TYPE, JSON_MIME),
            dp.body(),
        )
    }

    /// Patch a named instance.
    pub fn patch(&self, name: &str, pp: &PatchParams, patch: &Patch, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        pp.validate(patch)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{}/{}?", self.url_path, name));
        pp.populate_qp(&mut qp);
        opts.populate_qp(&mut qp);
        build(
            http::Request::patch(qp.finish())
                .header(http::header::ACCEPT, JSON_MIME)
                .header(http::header::CONTENT_TYPE, patch.content_type()),
            patch.body()?,
        )
    }

    /// Replace a named instance. `body` must carry `metadata.resourceVersion`.
    pub fn replace(&self, name: &str, pp: &PostParams, body: Vec<u8>, opts: &ApiOptions) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}/{}?", self.url_path, name));
        pp.populate_qp(&mut qp);
        opts.populate_qp(&mut qp);
        build(
            http::Request::put(qp.finish()).header(http::header::CONTENT_TYPE, JSON_MIME),
            body,
        )
    }

    /// Open a connect/exec call against a named instance's subresource
    /// (e.g. `pods/{name}/exec`). `query` is already flattened (see
    /// [`flatten_query`]); the websocket upgrade itself is a transport
    /// concern handled by the caller.
    pub fn connect(&self, subresource: &str, name: &str, query: &[(String, String)]) -> Result<http::Request<Vec<u8>>> {
        let mut qp = form_urlencoded::Serializer::new(format!("{}/{}/{}?", self.url_path, name, subresource));
        for (k, v) in query {
            qp.append_pair(k, v);
        }
        build(http::Request::get(qp.finish()), vec![])
    }
}

fn build(builder: http::request::Builder, body: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
    builder.body(body).map_err(Error::RequestBuild)
}

/// One query-parameter value before flattening.
#[derive(Debug, Clone, Copy)]
pub enum QueryValue<'a> {
    /// A single scalar value.
    Str(&'a str),
    /// A boolean, rendered as the literal strings `"true"`/`"false"`.
    Bool(bool),
    /// A sequence, exploded into one `(key, value)` pair per element in
    /// order (the Kubernetes exec convention for e.g. `command`).
    Seq(&'a [&'a str]),
}

/// Flatten `[(k, [v1, v2])]` into `[(k, v1), (k, v2)]`, preserving relative
/// order; scalar values pass through unchanged.
pub fn flatten_query(pairs: &[(&str, QueryValue<'_>)]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in pairs {
        match value {
            QueryValue::Str(s) => out.push((key.to_string(), s.to_string())),
            QueryValue::Bool(b) => out.push((key.to_string(), b.to_string())),
            QueryValue::Seq(values) => {
                for v in values.iter() {
                    out.push((key.to_string(), v.to_string()));
                }
            }
        }
    }
    out
}

/// `Content-Type` selection among offered media types: prefer
/// `application/json` or a wildcard offer, else the first offered type,
/// else `application/json` if nothing was offered.
pub fn select_content_type(content_types: &[&str]) -> String {
    if content_types.is_empty() {
        return JSON_MIME.to_string();
    }
    let lowered: Vec<String> = content_types.iter().map(|s| s.to_lowercase()).collect();
    if lowered.iter().any(|c| c == JSON_MIME || c == "*/*") {
        JSON_MIME.to_string()
    } else {
        lowered[0].clone()
    }
}

/// `Accept` header selection among offered media types: unset if nothing
/// was offered, `application/json` if offered, else every offered type
/// joined with `", "`.
pub fn select_accept(accepts: &[&str]) -> Option<String> {
    if accepts.is_empty() {
        return None;
    }
    let lowered: Vec<String> = accepts.iter().map(|s| s.to_lowercase()).collect();
    if lowered.iter().any(|a| a == JSON_MIME) {
        Some(JSON_MIME.to_string())
    } else {
        Some(lowered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_encodes_selectors() {
        let req = Request::new("/api/v1/namespaces")
            .list(&ListParams::default().labels("app=web"), &ApiOptions::default())
            .unwrap();
        assert_eq!(req.method(), http::Method::GET);
        assert!(req.uri().to_string().contains("labelSelector=app%3Dweb"));
    }

    #[test]
    fn watch_requires_resource_version_in_query() {
        let req = Request::new("/api/v1/namespaces")
            .watch(&WatchParams::default(), "1234", &ApiOptions::default())
            .unwrap();
        assert!(req.uri().to_string().contains("resourceVersion=1234"));
        assert!(req.uri().to_string().contains("watch=true"));
    }

    #[test]
    fn delete_sends_options_body() {
        let req = Request::new("/api/v1/namespaces")
            .delete("default", &DeleteParams::background(), &ApiOptions::default())
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
        assert_eq!(body, serde_json::json!({"propagationPolicy": "Background"}));
    }

    #[test]
    fn pretty_option_appends_query_param_to_get() {
        let req = Request::new("/api/v1/namespaces").get("default", &ApiOptions::default().pretty()).unwrap();
        assert!(req.uri().to_string().contains("pretty=true"));
    }

    #[test]
    fn pretty_option_appends_query_param_to_list() {
        let req = Request::new("/api/v1/namespaces")
            .list(&ListParams::default(), &ApiOptions::default().pretty())
            .unwrap();
        assert!(req.uri().to_string().contains("pretty=true"));
    }

    #[test]
    fn flattens_sequence_query_params_in_order() {
        let flattened = flatten_query(&[
            ("command", QueryValue::Seq(&["/bin/sh", "echo err >&2"])),
            ("stderr", QueryValue::Bool(true)),
        ]);
        assert_eq!(
            flattened,
            vec![
                ("command".to_string(), "/bin/sh".to_string()),
                ("command".to_string(), "echo err >&2".to_string()),
                ("stderr".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn connect_builds_exec_path_with_flattened_query() {
        let query = flatten_query(&[("command", QueryValue::Seq(&["/bin/sh", "echo err >&2"])), (
            "stderr",
            QueryValue::Bool(true),
        )]);
        let req = Request::new("/api/v1/namespaces/foo/pods")
            .connect("exec", "login-cd546cd56-q8254", &query)
            .unwrap();
        let uri = req.uri().to_string();
        assert!(uri.starts_with("/api/v1/namespaces/foo/pods/login-cd546cd56-q8254/exec?"));
        assert!(uri.contains("command=%2Fbin%2Fsh"));
        assert!(uri.contains("stderr=true"));
    }

    #[test]
    fn content_type_selection() {
        assert_eq!(select_content_type(&[]), "application/json");
        assert_eq!(select_content_type(&["foo", "bar"]), "foo");
        assert_eq!(select_content_type(&["*/*"]), "application/json");
    }

    #[test]
    fn accept_selection() {
        assert_eq!(select_accept(&[]), None);
        assert_eq!(select_accept(&["foo", "bar"]), Some("foo, bar".to_string()));
        assert_eq!(select_accept(&["APPLICATION/json", "foo"]), Some("application/json".to_string()));
    }
}
