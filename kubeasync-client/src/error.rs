//! Error handling for the transport, config, and protocol layers.
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type returned by [`crate::Client`] and [`crate::Config`].
#[derive(Error, Debug)]
pub enum Error {
    /// The server responded with a non-2xx status decoded as a `Status` object.
    ///
    /// Common for a `410 Gone` when a watch's `resourceVersion` has expired.
    #[error("api error: {reason} ({message})")]
    Api {
        /// HTTP status code the server returned.
        status: u16,
        /// Machine-readable reason string, if the server provided one.
        reason: String,
        /// Human-readable message, if the server provided one.
        message: String,
    },

    /// The underlying connection failed.
    #[error("connection error: {0}")]
    Connection(#[source] std::io::Error),

    /// A lower-level hyper error.
    #[error("hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    /// An error from the `hyper-util` legacy client (connect, pool, or the
    /// wrapped connector/service).
    #[error("client error: {0}")]
    LegacyClient(#[from] hyper_util::client::legacy::Error),

    /// A tower middleware returned an error.
    #[error("service error: {0}")]
    Service(#[source] tower::BoxError),

    /// Failed to build an `http::Request` from `kubeasync_core::request`.
    #[error("request build error: {0}")]
    RequestBuild(#[source] kubeasync_core::Error),

    /// Decoding a response body against the schema registry failed
    /// (unregistered type, schema/wire mismatch, bad JSON).
    #[error("response decode error: {0}")]
    Decode(#[source] kubeasync_core::Error),

    /// Failed to build an `http::Request` at the transport layer (invalid header, scheme, etc).
    #[error("http error: {0}")]
    Http(#[from] http::Error),

    /// Failed to construct a URI.
    #[error(transparent)]
    InvalidUri(#[from] http::uri::InvalidUri),

    /// A watch/list response body couldn't be read as UTF-8.
    #[error("utf-8 error: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    /// Failed to read the event stream body.
    #[error("error reading event stream: {0}")]
    ReadEvents(#[source] std::io::Error),

    /// Kubeconfig or in-cluster configuration failed to load.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A websocket exec/attach protocol violation.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors specific to loading a [`crate::Config`] from a kubeconfig file or
/// the in-cluster environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The basic-auth username/password couldn't be encoded as a header value.
    #[error("invalid basic auth: {0}")]
    InvalidBasicAuth(#[source] http::header::InvalidHeaderValue),

    /// The bearer token couldn't be encoded as a header value.
    #[error("invalid bearer token: {0}")]
    InvalidBearerToken(#[source] http::header::InvalidHeaderValue),

    /// Neither a kubeconfig nor the in-cluster environment could be loaded.
    #[error("failed to infer config: in-cluster ({cluster_env}), kubeconfig ({kubeconfig})")]
    ConfigInferenceExhausted {
        /// Why in-cluster loading failed.
        cluster_env: Box<Error>,
        /// Why kubeconfig loading failed.
        #[source]
        kubeconfig: Box<Error>,
    },

    /// The kubeconfig has no `current-context` set and none was given explicitly.
    #[error("failed to determine current context")]
    CurrentContextNotSet,

    /// One or more required in-cluster environment variables were unset.
    #[error("unable to load in-cluster config: {hostenv} and {portenv} must be set")]
    MissingInClusterVariables {
        /// Name of the missing host environment variable.
        hostenv: &'static str,
        /// Name of the missing port environment variable.
        portenv: &'static str,
    },

    /// The context names a cluster that isn't defined in the kubeconfig.
    #[error("unable to load cluster of context: {context_name}")]
    LoadClusterOfContext {
        /// Name of the context being resolved.
        context_name: String,
    },

    /// The context names a user that isn't defined in the kubeconfig.
    #[error("unable to find named user: {user_name}")]
    FindUser {
        /// Name of the user being resolved.
        user_name: String,
    },

    /// No kubeconfig path could be determined from `$KUBECONFIG` or `~/.kube/config`.
    #[error("unable to find path of kubeconfig")]
    NoKubeconfigPath,

    /// A base64-encoded field failed to decode.
    #[error("failed to decode base64: {0}")]
    Base64Decode(#[source] base64::DecodeError),

    /// Reading a referenced file (certificate, token, kubeconfig) failed.
    #[error("failed to read '{path:?}': {source}")]
    ReadFile {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Neither inline data nor a file path was set for a required field.
    #[error("failed to get data or file for '{field}'")]
    NoFileOrData {
        /// Name of the field that needed one of the two.
        field: &'static str,
    },

    /// The kubeconfig YAML failed to parse.
    #[error("failed to parse kubeconfig YAML: {0}")]
    ParseYaml(#[source] serde_yaml::Error),

    /// A certificate or key PEM block failed to parse.
    #[error("failed to parse PEM: {0}")]
    ParsePem(#[source] pem::PemError),

    /// The kubeconfig file contained no YAML documents.
    #[error("no YAML document found in kubeconfig at {0:?}")]
    EmptyKubeconfig(PathBuf),

    /// An exec-provider credential plugin is configured but exec-based
    /// authentication isn't supported.
    #[error("exec-based authentication is not supported: {0}")]
    AuthExecUnsupported(String),
}

/// Errors specific to the exec/websocket protocol.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The server did not respond with `101 Switching Protocols`.
    #[error("failed to switch protocol, server responded with status {0}")]
    ProtocolSwitch(http::StatusCode),

    /// The `Upgrade` response header wasn't `websocket`.
    #[error("Upgrade header was not set to websocket")]
    MissingUpgradeHeader,

    /// The `Sec-WebSocket-Accept` response header didn't match the expected value.
    #[error("Sec-WebSocket-Accept key mismatched")]
    SecWebSocketAcceptMismatch,

    /// None of the client's offered subprotocols were accepted.
    #[error("Sec-WebSocket-Protocol mismatched")]
    SecWebSocketProtocolMismatch,

    /// A channel-framed message carried a channel byte outside `0..=4`.
    #[error("unknown exec channel byte: {0}")]
    UnknownChannel(u8),

    /// An exec/attach session received a non-binary WebSocket frame
    /// (the pod-exec wire only ever carries binary channel frames).
    #[error("non-binary frame on an exec/attach session")]
    NonBinaryFrame,

    /// [`get_websocket_url`](crate::client::to_websocket_uri) was asked to
    /// upgrade a URI whose scheme isn't `http`/`https`.
    #[error("cannot upgrade scheme '{0}' to a websocket scheme")]
    UnsupportedScheme(String),
}

/// Convenience alias used across the client crate.
pub type Result<T> = std::result::Result<T, Error>;
