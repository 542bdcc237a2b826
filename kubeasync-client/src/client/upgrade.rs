//! Verifies the HTTP response to a WebSocket upgrade request (RFC 6455),
//! plus the subprotocol check pod-exec relies on.
//!
//! Only `v4.channel.k8s.io` is ever requested, so there's nothing to
//! negotiate here — a response naming any other subprotocol is a mismatch.
use http::{HeaderValue, Response, StatusCode};
use tokio_tungstenite::tungstenite as ws;

use crate::client::Body;
use crate::error::ProtocolError;

/// The only pod-exec subprotocol this client speaks.
pub const STREAM_PROTOCOL: &str = "v4.channel.k8s.io";

/// Set `Sec-WebSocket-Protocol: v4.channel.k8s.io` on an upgrade request.
pub fn add_to_headers(headers: &mut http::HeaderMap) {
    headers.insert(
        http::header::SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(STREAM_PROTOCOL),
    );
}

/// Verify an upgrade response: `101 Switching Protocols`, `Upgrade:
/// websocket`, `Connection: Upgrade`, a matching `Sec-WebSocket-Accept`, and
/// `Sec-WebSocket-Protocol: v4.channel.k8s.io`.
pub fn verify_response(res: &Response<Body>, key: &str) -> Result<(), ProtocolError> {
    if res.status() != StatusCode::SWITCHING_PROTOCOLS {
        return Err(ProtocolError::ProtocolSwitch(res.status()));
    }

    let headers = res.headers();
    let upgrade_ok = headers
        .get(http::header::UPGRADE)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);
    if !upgrade_ok {
        return Err(ProtocolError::MissingUpgradeHeader);
    }

    let accept_key = ws::handshake::derive_accept_key(key.as_ref());
    let accept_ok = headers.get(http::header::SEC_WEBSOCKET_ACCEPT).map(|h| h == &accept_key).unwrap_or(false);
    if !accept_ok {
        return Err(ProtocolError::SecWebSocketAcceptMismatch);
    }

    let protocol_ok = headers
        .get(http::header::SEC_WEBSOCKET_PROTOCOL)
        .map(|h| h.as_bytes() == STREAM_PROTOCOL.as_bytes())
        .unwrap_or(false);
    if !protocol_ok {
        return Err(ProtocolError::SecWebSocketProtocolMismatch);
    }

    Ok(())
}
