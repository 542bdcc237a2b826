//! The in-process domain object representation: a typed value carrying a
//! reference to its schema (by name) plus per-attribute slots.
use crate::error::{Error, Result};
use crate::schema::SchemaRegistry;
use chrono::{DateTime, NaiveDate, Utc};

/// An attribute value: `null`, a primitive, another domain object, an
/// ordered sequence, or a string-keyed mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Absent/explicit null. An attribute missing from the wire and an
    /// attribute explicitly set to `null` are indistinguishable, by design.
    Null,
    /// Boolean primitive.
    Bool(bool),
    /// Integer primitive (`int`/`long`).
    Int(i64),
    /// Floating point primitive.
    Float(f64),
    /// String primitive.
    Str(String),
    /// `date` primitive.
    Date(NaiveDate),
    /// `datetime` primitive.
    DateTime(DateTime<Utc>),
    /// A nested domain object.
    Object(DomainObject),
    /// An ordered sequence of values.
    List(Vec<AttrValue>),
    /// A string-keyed mapping of values, insertion order preserved.
    Dict(Vec<(String, AttrValue)>),
    /// An opaque JSON tree, used for the `object` primitive and for any
    /// value a caller wants to pass through without a registered schema.
    Raw(serde_json::Value),
}

/// An in-process typed representation of a Kubernetes resource (or any
/// schema-described type): a reference to a [`SchemaDescriptor`][crate::schema::SchemaDescriptor]
/// by name, plus ordered attribute slots.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainObject {
    type_name: &'static str,
    attrs: Vec<(&'static str, AttrValue)>,
}

impl DomainObject {
    /// An empty instance of `type_name` with every attribute set to `Null`.
    ///
    /// Used by the serializer when decoding from the wire: attributes
    /// absent on the wire are left `Null` rather than omitted.
    pub fn empty(type_name: &'static str) -> Self {
        Self {
            type_name,
            attrs: Vec::new(),
        }
    }

    /// This object's registered type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Get an attribute's value, if set. Attributes never explicitly set
    /// behave as `Null`.
    pub fn get(&self, attribute: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(n, _)| *n == attribute).map(|(_, v)| v)
    }

    /// Set (or overwrite) an attribute's value.
    pub fn set(&mut self, attribute: &'static str, value: AttrValue) {
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == attribute) {
            slot.1 = value;
        } else {
            self.attrs.push((attribute, value));
        }
    }

    /// Iterate over `(attribute_name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.attrs.iter().map(|(n, v)| (*n, v))
    }
}

/// Builder for [`DomainObject`] that validates required attributes are
/// present on [`finish`](Self::finish).
///
/// Mirrors the generated client's constructor-time validation: a required
/// attribute missing on construction fails with a validation error.
pub struct DomainObjectBuilder<'r> {
    registry: &'r SchemaRegistry,
    obj: DomainObject,
}

impl<'r> DomainObjectBuilder<'r> {
    /// Start building an instance of `type_name`, validated against
    /// `registry` on [`finish`](Self::finish).
    pub fn new(registry: &'r SchemaRegistry, type_name: &'static str) -> Self {
        Self {
            registry,
            obj: DomainObject::empty(type_name),
        }
    }

    /// Set an attribute. Does not validate that `attribute` is part of the
    /// schema until [`finish`](Self::finish).
    #[must_use]
    pub fn attr(mut self, attribute: &'static str, value: AttrValue) -> Self {
        self.obj.set(attribute, value);
        self
    }

    /// Validate required attributes are present and attribute names are
    /// known, then return the constructed object.
    pub fn finish(self) -> Result<DomainObject> {
        let desc = self
            .registry
            .get(self.obj.type_name)
            .ok_or_else(|| Error::UnknownType(self.obj.type_name.to_string()))?;

        for (attr_name, _) in &self.obj.attrs {
            if desc.attribute(attr_name).is_none() {
                return Err(Error::UnknownAttribute {
                    type_name: self.obj.type_name,
                    attribute: (*attr_name).to_string(),
                });
            }
        }

        for attr_name in desc.attribute_names() {
            let schema = desc.attribute(attr_name).expect("just listed");
            if schema.required {
                match self.obj.get(attr_name) {
                    Some(AttrValue::Null) | None => {
                        return Err(Error::MissingRequiredAttribute {
                            type_name: self.obj.type_name,
                            attribute: attr_name,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(self.obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DeclaredType, SchemaDescriptorBuilder};

    fn registry_with_example() -> SchemaRegistry {
        let mut reg = SchemaRegistry::new();
        reg.register(
            SchemaDescriptorBuilder::new("Example")
                .required("name", "name", DeclaredType::Str)
                .optional("count", "count", DeclaredType::Int)
                .build(),
        );
        reg
    }

    #[test]
    fn missing_required_fails() {
        let reg = registry_with_example();
        let err = DomainObjectBuilder::new(&reg, "Example").finish().unwrap_err();
        assert!(matches!(err, Error::MissingRequiredAttribute { .. }));
    }

    #[test]
    fn unknown_attribute_fails() {
        let reg = registry_with_example();
        let err = DomainObjectBuilder::new(&reg, "Example")
            .attr("name", AttrValue::Str("x".into()))
            .attr("bogus", AttrValue::Null)
            .finish()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));
    }

    #[test]
    fn construct_ok() {
        let reg = registry_with_example();
        let obj = DomainObjectBuilder::new(&reg, "Example")
            .attr("name", AttrValue::Str("x".into()))
            .finish()
            .unwrap();
        assert_eq!(obj.get("name"), Some(&AttrValue::Str("x".into())));
        assert_eq!(obj.get("count"), None);
    }
}
