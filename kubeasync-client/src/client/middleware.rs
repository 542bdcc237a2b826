//! Tower middleware layered onto the hyper client: base-URI rewriting and
//! static `Authorization` header injection. No refresh-token variant is
//! needed here — [`crate::Config::auth_header`] already resolves to a
//! single static header value, so there's no steady-state refresh to drive.
use http::{header::AUTHORIZATION, uri, HeaderValue, Request};
use tower::{Layer, Service};

/// Layer that rewrites every request's URI to be relative to `base_uri`,
/// preserving any path segment the base URI itself carries.
#[derive(Debug, Clone)]
pub struct BaseUriLayer {
    base_uri: http::Uri,
}

impl BaseUriLayer {
    /// Rewrite requests to be relative to `base_uri`.
    pub fn new(base_uri: http::Uri) -> Self {
        Self { base_uri }
    }
}

impl<S> Layer<S> for BaseUriLayer {
    type Service = BaseUri<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BaseUri {
            base_uri: self.base_uri.clone(),
            inner,
        }
    }
}

/// Service set up by [`BaseUriLayer`].
#[derive(Debug, Clone)]
pub struct BaseUri<S> {
    base_uri: http::Uri,
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for BaseUri<S>
where
    S: Service<Request<ReqBody>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (mut parts, body) = req.into_parts();
        let req_pandq = parts.uri.path_and_query();
        parts.uri = join_base_uri(&self.base_uri, req_pandq);
        self.inner.call(Request::from_parts(parts, body))
    }
}

/// Join `base_uri` and a request's path+query, preserving any path segment
/// `base_uri` itself carries (some clusters sit behind a reverse proxy path,
/// e.g. Rancher's `https://host/k8s/clusters/<id>`).
fn join_base_uri(base_uri: &http::Uri, req_pandq: Option<&uri::PathAndQuery>) -> http::Uri {
    let mut builder = uri::Builder::new();
    if let Some(scheme) = base_uri.scheme() {
        builder = builder.scheme(scheme.as_str());
    }
    if let Some(authority) = base_uri.authority() {
        builder = builder.authority(authority.as_str());
    }

    if let Some(pandq) = base_uri.path_and_query() {
        builder = if let Some(req_pandq) = req_pandq {
            let base_path = pandq.path().trim_end_matches('/');
            builder.path_and_query(format!("{base_path}{req_pandq}"))
        } else {
            builder.path_and_query(pandq.as_str())
        };
    } else if let Some(req_pandq) = req_pandq {
        builder = builder.path_and_query(req_pandq.as_str());
    }

    builder.build().expect("base uri and path+query compose into a valid uri")
}

/// Layer that sets a static `Authorization` header on every request.
#[derive(Debug, Clone)]
pub struct AuthLayer {
    value: HeaderValue,
}

impl AuthLayer {
    /// Attach `value` as the `Authorization` header of every request.
    pub fn new(value: HeaderValue) -> Self {
        Self { value }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = Auth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Auth {
            value: self.value.clone(),
            inner,
        }
    }
}

/// Service set up by [`AuthLayer`].
#[derive(Debug, Clone)]
pub struct Auth<S> {
    value: HeaderValue,
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for Auth<S>
where
    S: Service<Request<ReqBody>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_uri_preserving_proxy_path() {
        let base = http::Uri::from_static("https://example.com/foo/bar");
        let req_pandq = http::Uri::from_static("/api/v1/nodes?hi=yes");
        let joined = join_base_uri(&base, req_pandq.path_and_query());
        assert_eq!(joined.to_string(), "https://example.com/foo/bar/api/v1/nodes?hi=yes");
    }

    #[test]
    fn joins_base_uri_without_proxy_path() {
        let base = http::Uri::from_static("https://192.168.1.65:8443");
        let req_pandq = http::Uri::from_static("/api/v1/nodes?hi=yes");
        let joined = join_base_uri(&base, req_pandq.path_and_query());
        assert_eq!(joined.to_string(), "https://192.168.1.65:8443/api/v1/nodes?hi=yes");
    }
}
