//! Converts between [`DomainObject`]/[`AttrValue`] and the `serde_json::Value`
//! wire tree, driven entirely by a [`SchemaRegistry`].
//!
//! This is the generic replacement for the generated client's per-type
//! `to_dict`/`from_dict` methods: one pair of recursive functions, fed a
//! registry, produces the same behavior for every registered type.
use crate::error::{Error, Result};
use crate::schema::{DeclaredType, SchemaRegistry};
use crate::value::{AttrValue, DomainObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// Encode a domain object as a `serde_json::Value`, pruning attributes whose
/// value is `Null`: emitted payloads omit null/absent attributes rather than
/// emitting explicit `null`s.
pub fn to_wire(registry: &SchemaRegistry, obj: &DomainObject) -> Result<Value> {
    let desc = registry
        .get(obj.type_name())
        .ok_or_else(|| Error::UnknownType(obj.type_name().to_string()))?;

    let mut map = Map::new();
    for (attr_name, schema) in &desc.attributes {
        let value = obj.get(attr_name).unwrap_or(&AttrValue::Null);
        if matches!(value, AttrValue::Null) {
            continue;
        }
        map.insert(schema.wire_name.to_string(), value_to_wire(registry, value, &schema.declared_type)?);
    }
    Ok(Value::Object(map))
}

fn value_to_wire(registry: &SchemaRegistry, value: &AttrValue, declared: &DeclaredType) -> Result<Value> {
    match (value, declared) {
        (AttrValue::Null, _) => Ok(Value::Null),
        (AttrValue::Raw(v), _) => Ok(v.clone()),
        (AttrValue::Bool(b), DeclaredType::Bool) => Ok(Value::Bool(*b)),
        (AttrValue::Int(i), DeclaredType::Int | DeclaredType::Long) => Ok(Value::from(*i)),
        (AttrValue::Float(f), DeclaredType::Float) => Ok(Value::from(*f)),
        (AttrValue::Str(s), DeclaredType::Str) => Ok(Value::String(s.clone())),
        (AttrValue::Date(d), DeclaredType::Date) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
        (AttrValue::DateTime(dt), DeclaredType::DateTime) => {
            Ok(Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)))
        }
        (AttrValue::Object(obj), DeclaredType::Named(_) | DeclaredType::Object) => to_wire(registry, obj),
        (AttrValue::List(items), DeclaredType::List(inner)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_to_wire(registry, item, inner)?);
            }
            Ok(Value::Array(out))
        }
        (AttrValue::Dict(entries), DeclaredType::Dict(inner)) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.clone(), value_to_wire(registry, v, inner)?);
            }
            Ok(Value::Object(map))
        }
        (other, declared) => Err(Error::TypeMismatch {
            type_name: declared.describe().to_string(),
            expected: declared.describe(),
            found: attr_value_kind(other),
        }),
    }
}

/// Decode a `serde_json::Value` into a domain object of `type_name`,
/// resolving polymorphic subtypes via the schema's discriminator.
///
/// Malformed or extra attributes on the wire do not fail decoding: unknown
/// wire keys are silently ignored, and a value that doesn't match its
/// declared type decodes as `Null` for that attribute rather than aborting
/// the whole object. Only a genuinely unregistered type name fails.
pub fn from_wire(registry: &SchemaRegistry, type_name: &'static str, wire: &Value) -> Result<AttrValue> {
    let Value::Object(_) = wire else {
        return Ok(AttrValue::Raw(wire.clone()));
    };

    let mut resolved_name = type_name;
    let desc = registry
        .get(type_name)
        .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
    if let Some(discriminator) = desc.discriminator {
        if let Some(concrete) = discriminator(wire) {
            resolved_name = concrete;
        }
    }
    let desc = registry
        .get(resolved_name)
        .ok_or_else(|| Error::UnknownType(resolved_name.to_string()))?;

    let wire_map = wire.as_object().expect("checked above");
    let mut obj = DomainObject::empty(resolved_name);
    for (attr_name, schema) in &desc.attributes {
        let Some(wire_value) = wire_map.get(schema.wire_name) else {
            continue;
        };
        let decoded = value_from_wire(registry, wire_value, &schema.declared_type)
            .unwrap_or(AttrValue::Null);
        obj.set(attr_name, decoded);
    }
    Ok(AttrValue::Object(obj))
}

fn value_from_wire(registry: &SchemaRegistry, wire: &Value, declared: &DeclaredType) -> Result<AttrValue> {
    if wire.is_null() {
        return Ok(AttrValue::Null);
    }
    match declared {
        DeclaredType::Bool => wire.as_bool().map(AttrValue::Bool).ok_or_else(|| mismatch(declared, wire)),
        DeclaredType::Int | DeclaredType::Long => {
            wire.as_i64().map(AttrValue::Int).ok_or_else(|| mismatch(declared, wire))
        }
        DeclaredType::Float => wire.as_f64().map(AttrValue::Float).ok_or_else(|| mismatch(declared, wire)),
        DeclaredType::Str => wire.as_str().map(|s| AttrValue::Str(s.to_string())).ok_or_else(|| mismatch(declared, wire)),
        DeclaredType::Date => {
            let s = wire.as_str().ok_or_else(|| mismatch(declared, wire))?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(AttrValue::Date)
                .map_err(|e| Error::DateTimeParse("date", e))
        }
        DeclaredType::DateTime => {
            let s = wire.as_str().ok_or_else(|| mismatch(declared, wire))?;
            DateTime::parse_from_rfc3339(s)
                .map(|dt| AttrValue::DateTime(dt.with_timezone(&Utc)))
                .map_err(|e| Error::DateTimeParse("datetime", e))
        }
        DeclaredType::Object => Ok(AttrValue::Raw(wire.clone())),
        DeclaredType::Named(type_name) => from_wire(registry, type_name, wire),
        DeclaredType::List(inner) => {
            let items = wire.as_array().ok_or_else(|| mismatch(declared, wire))?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_from_wire(registry, item, inner).unwrap_or(AttrValue::Null));
            }
            Ok(AttrValue::List(out))
        }
        DeclaredType::Dict(inner) => {
            let map = wire.as_object().ok_or_else(|| mismatch(declared, wire))?;
            let mut out = Vec::with_capacity(map.len());
            for (k, v) in map {
                out.push((k.clone(), value_from_wire(registry, v, inner).unwrap_or(AttrValue::Null)));
            }
            Ok(AttrValue::Dict(out))
        }
    }
}

fn mismatch(declared: &DeclaredType, found: &Value) -> Error {
    Error::TypeMismatch {
        type_name: declared.describe().to_string(),
        expected: declared.describe(),
        found: json_kind(found),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn attr_value_kind(v: &AttrValue) -> &'static str {
    match v {
        AttrValue::Null => "null",
        AttrValue::Bool(_) => "boolean",
        AttrValue::Int(_) => "integer",
        AttrValue::Float(_) => "float",
        AttrValue::Str(_) => "string",
        AttrValue::Date(_) => "date",
        AttrValue::DateTime(_) => "datetime",
        AttrValue::Object(_) => "object",
        AttrValue::List(_) => "array",
        AttrValue::Dict(_) => "object",
        AttrValue::Raw(_) => "raw",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDescriptorBuilder;
    use crate::value::DomainObjectBuilder;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        reg.register(
            SchemaDescriptorBuilder::new("Pod")
                .required("name", "name", DeclaredType::Str)
                .optional("replicas", "replicas", DeclaredType::Int)
                .optional("tags", "tags", DeclaredType::List(Box::new(DeclaredType::Str)))
                .build(),
        );
        reg
    }

    #[test]
    fn round_trip_omits_null_optional() {
        let reg = registry();
        let obj = DomainObjectBuilder::new(&reg, "Pod")
            .attr("name", AttrValue::Str("web".into()))
            .finish()
            .unwrap();
        let wire = to_wire(&reg, &obj).unwrap();
        assert_eq!(wire, json!({"name": "web"}));
    }

    #[test]
    fn decode_ignores_unknown_wire_keys() {
        let reg = registry();
        let wire = json!({"name": "web", "unexpected": 42});
        let decoded = from_wire(&reg, "Pod", &wire).unwrap();
        let AttrValue::Object(obj) = decoded else { panic!("expected object") };
        assert_eq!(obj.get("name"), Some(&AttrValue::Str("web".into())));
    }

    #[test]
    fn decode_bad_type_yields_null_attribute_not_error() {
        let reg = registry();
        let wire = json!({"name": "web", "replicas": "not-a-number"});
        let decoded = from_wire(&reg, "Pod", &wire).unwrap();
        let AttrValue::Object(obj) = decoded else { panic!("expected object") };
        assert_eq!(obj.get("replicas"), Some(&AttrValue::Null));
    }
}
