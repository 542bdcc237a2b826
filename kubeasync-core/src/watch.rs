//! The decoded shape of one line from a watch response body.
//!
//! Ported from the tagged `{"type": ..., "object": ...}` envelope
//! Kubernetes' watch API emits, generalized to decode `object` against any
//! registered type rather than a single type parameter `K`.
use crate::error::Error;
use crate::schema::SchemaRegistry;
use crate::serializer::from_wire;
use crate::value::AttrValue;
use serde_json::Value;

/// The `type` tag of a decoded watch line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// A resource was added.
    Added,
    /// A resource was modified.
    Modified,
    /// A resource was deleted.
    Deleted,
    /// A bookmark carrying only an updated resource version.
    Bookmark,
    /// The server reported an error and is about to close the stream.
    Error,
}

/// One decoded line from a watch response.
///
/// A line that fails to parse as JSON, or whose shape doesn't match the
/// `{type, object}` envelope, decodes as [`WatchEvent::Malformed`] rather
/// than failing the whole stream: the iterator never terminates on a single
/// malformed event.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A well-formed, successfully decoded event.
    Ok {
        /// The event's tag.
        kind: WatchEventKind,
        /// The decoded object, or `None` if `object_type` has no registered schema.
        object: Option<AttrValue>,
        /// The exact line this event was decoded from.
        raw: Vec<u8>,
    },
    /// The line parsed as JSON but didn't match the expected envelope, or
    /// wasn't valid JSON at all. Carries the raw bytes for diagnostics.
    Malformed(Vec<u8>),
}

/// Decode one newline-framed watch line against `object_type`'s schema.
pub fn decode_line(registry: &SchemaRegistry, object_type: &'static str, line: &[u8]) -> WatchEvent {
    let Ok(value) = serde_json::from_slice::<Value>(line) else {
        return WatchEvent::Malformed(line.to_vec());
    };
    let Some(envelope) = value.as_object() else {
        return WatchEvent::Malformed(line.to_vec());
    };
    let Some(kind) = envelope.get("type").and_then(Value::as_str).and_then(parse_kind) else {
        return WatchEvent::Malformed(line.to_vec());
    };
    let inner = envelope.get("object").cloned().unwrap_or(Value::Null);

    let object = match kind {
        WatchEventKind::Error => None,
        _ => match from_wire(registry, object_type, &inner) {
            Ok(obj) => Some(obj),
            Err(Error::UnknownType(_)) => None,
            Err(_) => None,
        },
    };

    WatchEvent::Ok {
        kind,
        object,
        raw: line.to_vec(),
    }
}

/// Matches the `type` tag case-insensitively: the other tags follow the
/// same rule for consistency, since Kubernetes itself always emits them
/// upper-case.
fn parse_kind(tag: &str) -> Option<WatchEventKind> {
    if tag.eq_ignore_ascii_case("ADDED") {
        Some(WatchEventKind::Added)
    } else if tag.eq_ignore_ascii_case("MODIFIED") {
        Some(WatchEventKind::Modified)
    } else if tag.eq_ignore_ascii_case("DELETED") {
        Some(WatchEventKind::Deleted)
    } else if tag.eq_ignore_ascii_case("BOOKMARK") {
        Some(WatchEventKind::Bookmark)
    } else if tag.eq_ignore_ascii_case("ERROR") {
        Some(WatchEventKind::Error)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeclaredType, SchemaDescriptorBuilder};

    fn registry() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        reg.register(
            SchemaDescriptorBuilder::new("V1Namespace")
                .optional("name", "name", DeclaredType::Str)
                .build(),
        );
        reg
    }

    #[test]
    fn decodes_added_event() {
        let reg = registry();
        let line = br#"{"type":"ADDED","object":{"name":"default"}}"#;
        let event = decode_line(&reg, "V1Namespace", line);
        let WatchEvent::Ok { kind, object, raw } = event else { panic!("expected Ok") };
        assert_eq!(kind, WatchEventKind::Added);
        assert!(object.is_some());
        assert_eq!(raw, line);
    }

    #[test]
    fn raw_preserves_the_exact_input_line() {
        let mut reg = SchemaRegistry::new();
        reg.register(
            SchemaDescriptorBuilder::new("V1Namespace")
                .optional("metadata", "metadata", DeclaredType::Named("V1ObjectMeta"))
                .build(),
        );
        reg.register(
            SchemaDescriptorBuilder::new("V1ObjectMeta")
                .optional("name", "name", DeclaredType::Str)
                .build(),
        );
        let line = br#"{"type":"ADDED","object":{"metadata":{"name":"test0"},"spec":{},"status":{}}}"#;
        let event = decode_line(&reg, "V1Namespace", line);
        let WatchEvent::Ok { object, raw, .. } = event else { panic!("expected Ok") };
        assert_eq!(raw, line);
        let Some(AttrValue::Object(obj)) = object else { panic!("expected decoded object") };
        let Some(AttrValue::Object(metadata)) = obj.get("metadata") else { panic!("expected metadata") };
        assert_eq!(metadata.get("name"), Some(&AttrValue::Str("test0".into())));
    }

    #[test]
    fn garbage_line_is_malformed_not_a_panic() {
        let reg = registry();
        let event = decode_line(&reg, "V1Namespace", b"not json at all {{{");
        assert!(matches!(event, WatchEvent::Malformed(_)));
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let reg = registry();
        let event = decode_line(&reg, "V1Namespace", br#"{"type":"WEIRD","object":{}}"#);
        assert!(matches!(event, WatchEvent::Malformed(_)));
    }

    #[test]
    fn lowercase_error_tag_is_recognized_and_object_is_always_none() {
        let reg = registry();
        let line = br#"{"type":"error","object":{"name":"default"}}"#;
        let event = decode_line(&reg, "V1Namespace", line);
        let WatchEvent::Ok { kind, object, .. } = event else { panic!("expected Ok") };
        assert_eq!(kind, WatchEventKind::Error);
        assert!(object.is_none());
    }
}
