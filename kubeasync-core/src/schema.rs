//! The schema registry: a static lookup table from type name to the
//! attribute→(wire-name, declared-type) mapping the serializer drives off
//! of.
//!
//! This replaces the per-object runtime reflection (`attribute_map`,
//! `swagger_types`) that the generated Python client relies on with a
//! compact, codegen-friendly table. A code generator emitting this table
//! from an OpenAPI spec would produce exactly the [`SchemaDescriptor`]
//! values registered in [`crate::models`].
use serde_json::Value;
use std::collections::HashMap;

/// The declared type of an attribute, as it would appear in a generated
/// `swagger_types`-style map.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// JSON number decoded as `i64`.
    Int,
    /// JSON number decoded as `i64` (kept distinct from `Int` to mirror the
    /// source's `int`/`long` split; both decode identically here).
    Long,
    /// JSON number decoded as `f64`.
    Float,
    /// JSON string.
    Str,
    /// JSON boolean.
    Bool,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    Date,
    /// ISO-8601 timestamp.
    DateTime,
    /// Opaque JSON tree, passed through unparsed.
    Object,
    /// A named type looked up in the registry at decode time.
    Named(&'static str),
    /// A homogeneous ordered sequence of `T`.
    List(Box<DeclaredType>),
    /// A string-keyed mapping whose values decode as `V`.
    ///
    /// Keys are taken verbatim as strings; this only decodes values. This
    /// matches observed Kubernetes usage (all map keys are strings) but
    /// isn't fully general.
    Dict(Box<DeclaredType>),
}

impl DeclaredType {
    /// Shorthand for `List(Named(t))`.
    pub fn list_of(t: &'static str) -> Self {
        DeclaredType::List(Box::new(DeclaredType::Named(t)))
    }

    /// Shorthand for `Dict(Named(t))`.
    pub fn dict_of(t: &'static str) -> Self {
        DeclaredType::Dict(Box::new(DeclaredType::Named(t)))
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            DeclaredType::Int | DeclaredType::Long => "integer",
            DeclaredType::Float => "float",
            DeclaredType::Str => "string",
            DeclaredType::Bool => "boolean",
            DeclaredType::Date => "date",
            DeclaredType::DateTime => "datetime",
            DeclaredType::Object => "object",
            DeclaredType::Named(_) => "object",
            DeclaredType::List(_) => "array",
            DeclaredType::Dict(_) => "object",
        }
    }
}

/// One attribute's wire-name and declared type, plus whether it must be
/// present when a caller constructs the type programmatically.
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    /// The name used on the wire (typically `camelCase`).
    pub wire_name: &'static str,
    /// The declared type used to recursively decode/encode this attribute.
    pub declared_type: DeclaredType,
    /// Whether construction must supply this attribute.
    pub required: bool,
}

/// A rule for resolving a polymorphic type to a concrete subtype by
/// inspecting the wire tree. Returns `None` to keep decoding as the base
/// type.
pub type DiscriminatorFn = fn(&Value) -> Option<&'static str>;

/// Ordered mapping from attribute name to (wire-name, declared-type) for one
/// named type, plus optional polymorphic dispatch.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    /// The registered type name (matches the registry key).
    pub type_name: &'static str,
    /// Attributes in declaration order; order drives `to_wire` key order.
    pub attributes: Vec<(&'static str, AttributeSchema)>,
    /// Optional discriminator used to resolve a concrete subtype.
    pub discriminator: Option<DiscriminatorFn>,
}

impl SchemaDescriptor {
    /// Look up one attribute's schema by attribute name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    /// The set of attribute names, in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().map(|(n, _)| *n)
    }
}

/// A builder for [`SchemaDescriptor`], used by [`crate::models`] to keep
/// registration declarative.
#[derive(Debug, Default)]
pub struct SchemaDescriptorBuilder {
    type_name: &'static str,
    attributes: Vec<(&'static str, AttributeSchema)>,
    discriminator: Option<DiscriminatorFn>,
}

impl SchemaDescriptorBuilder {
    /// Start building the schema for `type_name`.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            attributes: Vec::new(),
            discriminator: None,
        }
    }

    /// Add a required attribute.
    #[must_use]
    pub fn required(mut self, attribute: &'static str, wire_name: &'static str, ty: DeclaredType) -> Self {
        self.attributes.push((attribute, AttributeSchema {
            wire_name,
            declared_type: ty,
            required: true,
        }));
        self
    }

    /// Add an optional attribute.
    #[must_use]
    pub fn optional(mut self, attribute: &'static str, wire_name: &'static str, ty: DeclaredType) -> Self {
        self.attributes.push((attribute, AttributeSchema {
            wire_name,
            declared_type: ty,
            required: false,
        }));
        self
    }

    /// Install a discriminator used to resolve concrete subtypes.
    #[must_use]
    pub fn discriminator(mut self, f: DiscriminatorFn) -> Self {
        self.discriminator = Some(f);
        self
    }

    /// Finish building.
    pub fn build(self) -> SchemaDescriptor {
        SchemaDescriptor {
            type_name: self.type_name,
            attributes: self.attributes,
            discriminator: self.discriminator,
        }
    }
}

/// Lookup table from type name to [`SchemaDescriptor`].
///
/// Immutable once constructed; see [`crate::models::registry`] for the
/// process-wide instance built at first use.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<&'static str, SchemaDescriptor>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, overwriting any previous entry for the same type
    /// name.
    pub fn register(&mut self, descriptor: SchemaDescriptor) {
        self.types.insert(descriptor.type_name, descriptor);
    }

    /// Look up a schema by type name.
    pub fn get(&self, type_name: &str) -> Option<&SchemaDescriptor> {
        self.types.get(type_name)
    }

    /// Whether a type name is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup() {
        let desc = SchemaDescriptorBuilder::new("Example")
            .required("name", "name", DeclaredType::Str)
            .optional("count", "count", DeclaredType::Int)
            .build();
        assert_eq!(desc.attribute("name").unwrap().wire_name, "name");
        assert!(desc.attribute("missing").is_none());
        assert_eq!(desc.attribute_names().collect::<Vec<_>>(), vec!["name", "count"]);
    }

    #[test]
    fn registry_round_trip() {
        let mut reg = SchemaRegistry::new();
        reg.register(SchemaDescriptorBuilder::new("Thing").build());
        assert!(reg.contains("Thing"));
        assert!(reg.get("Other").is_none());
    }
}
