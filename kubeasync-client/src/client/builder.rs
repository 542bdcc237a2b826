//! Assembles the default tower [`Service`] stack a [`crate::Client`] runs on
//! top of: an HTTPS-capable `hyper-util` legacy client wrapped in a
//! connect/read timeout, then a bounded concurrency limit,
//! [`BaseUriLayer`], an optional [`AuthLayer`], and a [`TraceLayer`].
//!
//! This is a single function rather than a generic `ClientBuilder<Svc>`
//! callers could splice arbitrary layers into; nothing here needs that
//! generality.
use std::time::Duration;

use http::header::HeaderMap;
use http::{Request, Response};
use hyper_timeout::TimeoutConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use tower::{limit::ConcurrencyLimitLayer, util::BoxService, BoxError, Layer, ServiceBuilder};
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::client::body::Body;
use crate::client::middleware::{AuthLayer, BaseUriLayer};
use crate::client::tls;
use crate::{Config, Error, Result};

/// Matches `aiohttp.TCPConnector(limit=4)`, the original client's per-process
/// connection cap (`aiokubernetes/clients.py`). `hyper`'s own pool has no
/// such ceiling, so it's enforced as a concurrency limit on the outer
/// service instead of a connector setting.
const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

/// Build the default request/response [`Service`](tower::Service) stack for
/// `config`: TLS-capable transport, base-URI rewriting, optional static
/// `Authorization` header, and HTTP tracing.
pub fn build_service(config: &Config) -> Result<BoxService<Request<Body>, Response<Body>, BoxError>> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let tls_config = tls::client_config(
        config.identity_pem.as_deref(),
        config.root_cert.as_deref(),
        config.accept_invalid_certs,
    )
    .map_err(|e| Error::Connection(std::io::Error::other(e)))?;

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    let mut connector = TimeoutConnector::new(https);
    connector.set_connect_timeout(config.timeout);
    connector.set_read_timeout(config.timeout);

    let client: LegacyClient<_, Body> = LegacyClient::builder(TokioExecutor::new()).build(connector);

    let auth_header = config.auth_header()?;

    let service = ServiceBuilder::new()
        .layer(ConcurrencyLimitLayer::new(DEFAULT_CONCURRENCY_LIMIT))
        .layer(BaseUriLayer::new(config.cluster_url.clone()))
        .option_layer(auth_header.map(AuthLayer::new))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::debug_span!(
                        "HTTP",
                        http.method = %req.method(),
                        http.url = %req.uri(),
                        http.status_code = tracing::field::Empty,
                        otel.kind = "client",
                        otel.status_code = tracing::field::Empty,
                    )
                })
                .on_request(|_req: &Request<Body>, _span: &Span| {
                    tracing::debug!("requesting");
                })
                .on_response(|res: &Response<Body>, _latency: Duration, span: &Span| {
                    let status = res.status();
                    span.record("http.status_code", status.as_u16());
                    if status.is_client_error() || status.is_server_error() {
                        span.record("otel.status_code", "ERROR");
                    }
                })
                .on_body_chunk(())
                .on_eos(|_: Option<&HeaderMap>, _duration: Duration, _span: &Span| {
                    tracing::debug!("stream closed");
                })
                .on_failure(|ec: ServerErrorsFailureClass, _latency: Duration, span: &Span| {
                    span.record("otel.status_code", "ERROR");
                    match ec {
                        ServerErrorsFailureClass::StatusCode(status) => {
                            span.record("http.status_code", status.as_u16());
                            tracing::error!("failed with status {}", status);
                        }
                        ServerErrorsFailureClass::Error(err) => {
                            tracing::error!("failed with error {}", err);
                        }
                    }
                }),
        )
        .map_err(BoxError::from)
        .service(client);

    Ok(BoxService::new(
        tower_http::map_response_body::MapResponseBodyLayer::new(Body::wrap).layer(service),
    ))
}

#[cfg(test)]
mod tests {
    use futures::pin_mut;
    use tokio_test::{assert_pending, assert_ready_ok};
    use tower::Service;
    use tower_test::mock;

    use super::*;

    /// A fifth concurrent caller against a `ConcurrencyLimitLayer::new(4)`
    /// stack must not become ready until one of the first four completes.
    #[tokio::test]
    async fn concurrency_limit_matches_the_original_connector_cap() {
        let (mut service, handle) =
            mock::spawn_layer::<(), (), _>(ConcurrencyLimitLayer::new(DEFAULT_CONCURRENCY_LIMIT));
        pin_mut!(handle);

        let mut in_flight = Vec::new();
        for _ in 0..DEFAULT_CONCURRENCY_LIMIT {
            assert_ready_ok!(service.poll_ready());
            in_flight.push(service.call(()));
        }

        assert_pending!(service.poll_ready());

        let (_, send) = handle.next_request().await.expect("service not called");
        send.send_response(());
        in_flight.remove(0).await.unwrap();

        assert_ready_ok!(service.poll_ready());
    }
}
