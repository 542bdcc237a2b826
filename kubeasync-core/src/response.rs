//! Generic API response shapes: the `Status` object returned by delete
//! calls and by the apiserver on error, simplified relative to the full
//! `apimachinery` type the way the generated client's own `V1Status` is.
use crate::schema::{DeclaredType, SchemaDescriptor, SchemaDescriptorBuilder};
use crate::value::DomainObject;

/// Register the `Status`/`StatusDetails`/`StatusCause` schemas under their
/// GVK-style registry names (`apiVersion: v1, kind: Status`).
pub(crate) fn schemas() -> Vec<SchemaDescriptor> {
    vec![
        SchemaDescriptorBuilder::new("V1Status")
            .optional("code", "code", DeclaredType::Int)
            .optional("status", "status", DeclaredType::Str)
            .optional("message", "message", DeclaredType::Str)
            .optional("reason", "reason", DeclaredType::Str)
            .optional("details", "details", DeclaredType::Named("V1StatusDetails"))
            .build(),
        SchemaDescriptorBuilder::new("V1StatusDetails")
            .optional("name", "name", DeclaredType::Str)
            .optional("group", "group", DeclaredType::Str)
            .optional("kind", "kind", DeclaredType::Str)
            .optional("uid", "uid", DeclaredType::Str)
            .optional("causes", "causes", DeclaredType::list_of("V1StatusCause"))
            .optional("retry_after_seconds", "retryAfterSeconds", DeclaredType::Int)
            .build(),
        SchemaDescriptorBuilder::new("V1StatusCause")
            .optional("reason", "reason", DeclaredType::Str)
            .optional("message", "message", DeclaredType::Str)
            .optional("field", "field", DeclaredType::Str)
            .build(),
    ]
}

/// A convenience accessor over a decoded `V1Status` [`DomainObject`],
/// mirroring the string accessors the generated client's error-handling
/// path reaches for (`reason`, `message`, status code).
pub struct StatusView<'a>(pub &'a DomainObject);

impl<'a> StatusView<'a> {
    /// The machine-readable reason string (e.g. `"NotFound"`), if present.
    pub fn reason(&self) -> Option<&str> {
        match self.0.get("reason") {
            Some(crate::value::AttrValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The human-readable message, if present.
    pub fn message(&self) -> Option<&str> {
        match self.0.get("message") {
            Some(crate::value::AttrValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The suggested HTTP status code, if present.
    pub fn code(&self) -> Option<i64> {
        match self.0.get("code") {
            Some(crate::value::AttrValue::Int(i)) => Some(*i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use crate::serializer::from_wire;
    use serde_json::json;

    #[test]
    fn decode_status_with_details() {
        let mut reg = SchemaRegistry::new();
        for s in schemas() {
            reg.register(s);
        }
        let wire = json!({
            "status": "Failure",
            "reason": "NotFound",
            "code": 404,
            "details": {"name": "some-app", "group": "clux.dev", "kind": "foos"}
        });
        let decoded = from_wire(&reg, "V1Status", &wire).unwrap();
        let crate::value::AttrValue::Object(obj) = decoded else { panic!() };
        let view = StatusView(&obj);
        assert_eq!(view.reason(), Some("NotFound"));
        assert_eq!(view.code(), Some(404));
    }
}
