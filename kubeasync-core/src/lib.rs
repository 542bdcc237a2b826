//! Transport-independent core of an asynchronous Kubernetes API client:
//! a schema registry and serializer standing in for per-type generated
//! structs, plus the request-shaping and response-shaping types that don't
//! need a live connection to exist (params, watch events, status
//! responses, GVK resolution).
//!
//! Everything that talks to a socket lives in `kubeasync-client`, built on
//! top of this crate.

pub mod error;
pub mod gvk;
pub mod models;
pub mod params;
pub mod request;
pub mod response;
pub mod schema;
pub mod serializer;
pub mod value;
pub mod watch;

pub use error::{Error, Result};
pub use schema::{DeclaredType, SchemaDescriptor, SchemaDescriptorBuilder, SchemaRegistry};
pub use request::{flatten_query, select_accept, select_content_type, QueryValue, Request};
pub use value::{AttrValue, DomainObject, DomainObjectBuilder};
