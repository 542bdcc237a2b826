//! The transport-facing `Client`: a cheap-to-clone handle onto the tower
//! service stack built by [`builder::build_service`], plus the WebSocket
//! upgrade path exec/attach sessions start from.
use either::Either;
use http::{header::HeaderValue, Request, Response, StatusCode};
use tokio_tungstenite::{tungstenite as ws, WebSocketStream};
use tower::{buffer::Buffer, util::BoxService, BoxError, Service, ServiceExt};

use kubeasync_core::value::AttrValue;

use crate::error::ProtocolError;
use crate::{Config, Error, Result};
use crate::watch::WatchStream;

mod body;
mod builder;
mod middleware;
mod tls;
mod upgrade;

pub use body::Body;
pub use middleware::{Auth, AuthLayer, BaseUri, BaseUriLayer};

/// A cheap-to-clone handle onto a Kubernetes API server.
///
/// Build one with [`Client::try_from`] (or [`Client::new`] for a custom
/// tower stack); the typed operation surface in [`crate::api::Api`] is built
/// on top of the raw request/response methods here.
#[derive(Clone)]
pub struct Client {
    inner: Buffer<BoxService<Request<Body>, Response<Body>, BoxError>, Request<Body>>,
    default_namespace: String,
}

impl Client {
    /// Build a [`Client`] from a custom tower [`Service`] stack, bypassing
    /// [`builder::build_service`]'s default one.
    pub fn new<S>(service: S, default_namespace: impl Into<String>) -> Self
    where
        S: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
    {
        let service = BoxService::new(service.map_err(Into::into));
        Self {
            inner: Buffer::new(service, 1024),
            default_namespace: default_namespace.into(),
        }
    }

    /// Build the default client for `config`.
    pub fn try_from(config: Config) -> Result<Self> {
        let default_namespace = config.default_namespace.clone();
        let service = builder::build_service(&config)?;
        Ok(Self::new(service, default_namespace))
    }

    /// The namespace requests without an explicit one fall back to.
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Send a raw request and return the raw response, performing no
    /// decoding. The typed `request*` methods below build on this.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let mut svc = self.inner.clone();
        svc.ready().await.map_err(Error::Service)?.call(request).await.map_err(|err| {
            err.downcast::<Error>()
                .map(|e| *e)
                .or_else(|err| err.downcast::<hyper::Error>().map(|e| Error::Hyper(*e)))
                .unwrap_or_else(Error::Service)
        })
    }

    /// Start a WebSocket exec/attach session: perform the HTTP Upgrade
    /// handshake for `request` and hand back the raw frame stream.
    ///
    /// `request`'s URI must already point at a `connect`-style subresource
    /// (see [`kubeasync_core::Request::connect`]); this only adds the
    /// Upgrade-specific headers.
    pub async fn connect(&self, request: Request<Vec<u8>>) -> Result<WebSocketStream<hyper_util::rt::TokioIo<hyper::upgrade::Upgraded>>> {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(http::header::CONNECTION, HeaderValue::from_static("Upgrade"));
        parts.headers.insert(http::header::UPGRADE, HeaderValue::from_static("websocket"));
        parts
            .headers
            .insert(http::header::SEC_WEBSOCKET_VERSION, HeaderValue::from_static("13"));
        let key = sec_websocket_key();
        parts
            .headers
            .insert(http::header::SEC_WEBSOCKET_KEY, key.parse().expect("valid header value"));
        upgrade::add_to_headers(&mut parts.headers);

        let res = self.send(Request::from_parts(parts, Body::from(body))).await?;
        upgrade::verify_response(&res, &key)?;

        let upgraded = hyper::upgrade::on(res).await.map_err(Error::Hyper)?;
        let io = hyper_util::rt::TokioIo::new(upgraded);
        Ok(WebSocketStream::from_raw_socket(io, ws::protocol::Role::Client, None).await)
    }

    /// Send a request and return the decoded response body as text, after
    /// translating a non-2xx status into [`Error::Api`].
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String> {
        let res = self.send(request.map(Body::from)).await?;
        let status = res.status();
        let bytes = http_body_util::BodyExt::collect(res.into_body()).await?.to_bytes();
        let text = String::from_utf8(bytes.to_vec())?;
        handle_api_errors(&text, status)?;
        Ok(text)
    }

    /// Send a request and decode the response body against the process-wide
    /// schema registry as an instance of `type_name`.
    pub async fn request(&self, request: Request<Vec<u8>>, type_name: &'static str) -> Result<AttrValue> {
        let text = self.request_text(request).await?;
        let wire: serde_json::Value = serde_json::from_str(&text).map_err(kubeasync_core::Error::from)
            .map_err(Error::Decode)?;
        kubeasync_core::serializer::from_wire(&kubeasync_core::models::REGISTRY, type_name, &wire).map_err(Error::Decode)
    }

    /// Send a request and decode the response as either an instance of
    /// `type_name`, or a `V1Status` object (common on delete/patch errors).
    pub async fn request_status(&self, request: Request<Vec<u8>>, type_name: &'static str) -> Result<Either<AttrValue, AttrValue>> {
        let text = self.request_text(request).await?;
        let wire: serde_json::Value = serde_json::from_str(&text).map_err(kubeasync_core::Error::from).map_err(Error::Decode)?;
        let registry = &kubeasync_core::models::REGISTRY;
        if wire.get("kind").and_then(serde_json::Value::as_str) == Some("Status") {
            tracing::trace!("status response: {text}");
            kubeasync_core::serializer::from_wire(registry, "V1Status", &wire).map(Either::Right).map_err(Error::Decode)
        } else {
            kubeasync_core::serializer::from_wire(registry, type_name, &wire).map(Either::Left).map_err(Error::Decode)
        }
    }

    /// Send a watch/list request and return a stream of decoded watch
    /// events against the process-wide schema registry.
    pub async fn request_events(&self, request: Request<Vec<u8>>, object_type: &'static str) -> Result<WatchStream> {
        let res = self.send(request.map(Body::from)).await?;
        tracing::trace!(headers = ?res.headers(), "streaming watch response");
        Ok(WatchStream::new(res.into_body(), object_type))
    }
}

fn handle_api_errors(text: &str, status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let (reason, message) = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .filter(|v| v.get("kind").and_then(serde_json::Value::as_str) == Some("Status"))
        .map(|v| {
            (
                v.get("reason").and_then(serde_json::Value::as_str).unwrap_or_default().to_string(),
                v.get("message").and_then(serde_json::Value::as_str).unwrap_or_default().to_string(),
            )
        })
        .unwrap_or_else(|| (status.canonical_reason().unwrap_or("Unknown").to_string(), text.to_string()));
    Err(Error::Api {
        status: status.as_u16(),
        reason,
        message,
    })
}

fn sec_websocket_key() -> String {
    use rand::RngCore;
    let mut raw = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut raw);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, raw)
}

/// Rewrite an `http`/`https` URI to its `ws`/`wss` equivalent for a WebSocket
/// upgrade. The input scheme is matched case-insensitively; the output is
/// always lowercase. Any other scheme fails fast.
pub fn to_websocket_uri(uri: &http::Uri) -> Result<http::Uri> {
    let scheme = uri.scheme_str().unwrap_or_default();
    let new_scheme = if scheme.eq_ignore_ascii_case("https") {
        "wss"
    } else if scheme.eq_ignore_ascii_case("http") {
        "ws"
    } else {
        return Err(Error::Protocol(ProtocolError::UnsupportedScheme(scheme.to_string())));
    };
    let authority = uri.authority().map(|a| a.as_str()).unwrap_or_default();
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    format!("{new_scheme}://{authority}{path_and_query}")
        .parse::<http::Uri>()
        .map_err(Error::InvalidUri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_http_scheme_to_ws() {
        let uri = http::Uri::from_static("http://localhost/api");
        assert_eq!(to_websocket_uri(&uri).unwrap().to_string(), "ws://localhost/api");
    }

    #[test]
    fn upgrades_https_scheme_case_insensitively_to_wss() {
        let uri = "HtTps://domain.com/api".parse::<http::Uri>().unwrap();
        assert_eq!(to_websocket_uri(&uri).unwrap().to_string(), "wss://domain.com/api");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let uri = http::Uri::from_static("foo://bar.com");
        let err = to_websocket_uri(&uri).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::UnsupportedScheme(_))));
    }
}
