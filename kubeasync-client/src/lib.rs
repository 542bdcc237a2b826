//! The transport layer of an asynchronous Kubernetes API client: loads
//! cluster configuration and credentials, dispatches HTTP requests built by
//! [`kubeasync_core::Request`], decodes responses against
//! [`kubeasync_core::SchemaRegistry`], and drives the watch/exec long-lived
//! protocols.
//!
//! Transport-independent shaping (request building, the (de)serializer, the
//! domain object model) lives in `kubeasync-core`; this crate is the part
//! that actually opens a socket.
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod exec;
pub mod watch;

pub use client::Client;
pub use config::Config;
pub use error::{ConfigError, Error, ProtocolError, Result};
