//! Error taxonomy for the transport-independent core.
//!
//! These are the two categories of error raised at the API surface, never
//! retried: a malformed construction (`Validation`) or a wire/domain
//! mismatch (`Serialization`/`UnknownType`/`TypeMismatch`).
//! Transport-facing errors (`TransportError`, `ApiError`, `ProtocolError`)
//! live in `kubeasync-client`.
use thiserror::Error;

/// Errors raised by the schema registry, serializer, and domain object
/// builder.
#[derive(Debug, Error)]
pub enum Error {
    /// A required attribute was missing when constructing a domain object.
    #[error("missing required attribute `{attribute}` on `{type_name}`")]
    MissingRequiredAttribute {
        /// Name of the type being constructed.
        type_name: &'static str,
        /// Attribute that was required but absent.
        attribute: &'static str,
    },

    /// An unknown keyword/attribute name was used when constructing a domain object.
    #[error("`{type_name}` has no attribute named `{attribute}`")]
    UnknownAttribute {
        /// Name of the type being constructed.
        type_name: &'static str,
        /// Attribute name that isn't part of the schema.
        attribute: String,
    },

    /// `from_wire` was asked to decode into a type name with no registered schema.
    #[error("no schema registered for type `{0}`")]
    UnknownType(String),

    /// The wire value's JSON shape didn't match the declared type.
    #[error("expected a {expected} while decoding `{type_name}`, found {found}")]
    TypeMismatch {
        /// Declared type being decoded into, rendered for diagnostics.
        type_name: String,
        /// What was expected given the declared type.
        expected: &'static str,
        /// What the JSON tree actually held.
        found: &'static str,
    },

    /// Failed to parse an ISO-8601 `date` or `datetime` primitive.
    #[error("failed to parse ISO-8601 {0}: {1}")]
    DateTimeParse(&'static str, chrono::ParseError),

    /// JSON parse failure while decoding a wire payload.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to assemble an `http::Request` (e.g. an invalid header value).
    #[error("failed to build request: {0}")]
    RequestBuild(#[source] http::Error),
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;
