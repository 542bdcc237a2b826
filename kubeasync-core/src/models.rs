//! Schema registrations for a representative slice of the core `v1` API
//! group: `Pod` and `Namespace`, plus the metadata/list envelopes every
//! resource shares.
//!
//! In a full client these tables would be emitted by a code generator
//! reading the Kubernetes OpenAPI spec, the same way `k8s-openapi`
//! generates its typed structs; here they're registered by hand for the
//! subset this crate exposes a typed API surface for.
use crate::gvk;
use crate::schema::{DeclaredType, SchemaDescriptorBuilder, SchemaRegistry};
use crate::{response, watch};
use once_cell::sync::Lazy;

fn object_meta() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1ObjectMeta")
        .optional("name", "name", DeclaredType::Str)
        .optional("generate_name", "generateName", DeclaredType::Str)
        .optional("namespace", "namespace", DeclaredType::Str)
        .optional("uid", "uid", DeclaredType::Str)
        .optional("resource_version", "resourceVersion", DeclaredType::Str)
        .optional("generation", "generation", DeclaredType::Long)
        .optional("creation_timestamp", "creationTimestamp", DeclaredType::DateTime)
        .optional("deletion_timestamp", "deletionTimestamp", DeclaredType::DateTime)
        .optional("labels", "labels", DeclaredType::Dict(Box::new(DeclaredType::Str)))
        .optional("annotations", "annotations", DeclaredType::Dict(Box::new(DeclaredType::Str)))
        .optional("finalizers", "finalizers", DeclaredType::List(Box::new(DeclaredType::Str)))
        .build()
}

fn list_meta() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1ListMeta")
        .optional("resource_version", "resourceVersion", DeclaredType::Str)
        .optional("continue_token", "continue", DeclaredType::Str)
        .optional("remaining_item_count", "remainingItemCount", DeclaredType::Long)
        .build()
}

fn container() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1Container")
        .required("name", "name", DeclaredType::Str)
        .optional("image", "image", DeclaredType::Str)
        .optional("command", "command", DeclaredType::List(Box::new(DeclaredType::Str)))
        .optional("args", "args", DeclaredType::List(Box::new(DeclaredType::Str)))
        .optional("working_dir", "workingDir", DeclaredType::Str)
        .optional("image_pull_policy", "imagePullPolicy", DeclaredType::Str)
        .build()
}

fn pod_spec() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1PodSpec")
        .required("containers", "containers", DeclaredType::list_of("V1Container"))
        .optional("restart_policy", "restartPolicy", DeclaredType::Str)
        .optional("service_account_name", "serviceAccountName", DeclaredType::Str)
        .optional("node_name", "nodeName", DeclaredType::Str)
        .build()
}

fn pod_status() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1PodStatus")
        .optional("phase", "phase", DeclaredType::Str)
        .optional("host_ip", "hostIP", DeclaredType::Str)
        .optional("pod_ip", "podIP", DeclaredType::Str)
        .optional("start_time", "startTime", DeclaredType::DateTime)
        .optional("message", "message", DeclaredType::Str)
        .optional("reason", "reason", DeclaredType::Str)
        .build()
}

fn pod() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1Pod")
        .optional("api_version", "apiVersion", DeclaredType::Str)
        .optional("kind", "kind", DeclaredType::Str)
        .optional("metadata", "metadata", DeclaredType::Named("V1ObjectMeta"))
        .optional("spec", "spec", DeclaredType::Named("V1PodSpec"))
        .optional("status", "status", DeclaredType::Named("V1PodStatus"))
        .build()
}

fn pod_list() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1PodList")
        .optional("api_version", "apiVersion", DeclaredType::Str)
        .optional("kind", "kind", DeclaredType::Str)
        .optional("metadata", "metadata", DeclaredType::Named("V1ListMeta"))
        .required("items", "items", DeclaredType::list_of("V1Pod"))
        .build()
}

fn namespace_spec() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1NamespaceSpec")
        .optional("finalizers", "finalizers", DeclaredType::List(Box::new(DeclaredType::Str)))
        .build()
}

fn namespace_status() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1NamespaceStatus")
        .optional("phase", "phase", DeclaredType::Str)
        .build()
}

fn namespace() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1Namespace")
        .optional("api_version", "apiVersion", DeclaredType::Str)
        .optional("kind", "kind", DeclaredType::Str)
        .optional("metadata", "metadata", DeclaredType::Named("V1ObjectMeta"))
        .optional("spec", "spec", DeclaredType::Named("V1NamespaceSpec"))
        .optional("status", "status", DeclaredType::Named("V1NamespaceStatus"))
        .build()
}

fn namespace_list() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1NamespaceList")
        .optional("api_version", "apiVersion", DeclaredType::Str)
        .optional("kind", "kind", DeclaredType::Str)
        .optional("metadata", "metadata", DeclaredType::Named("V1ListMeta"))
        .required("items", "items", DeclaredType::list_of("V1Namespace"))
        .build()
}

fn preconditions() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1Preconditions")
        .optional("resource_version", "resourceVersion", DeclaredType::Str)
        .optional("uid", "uid", DeclaredType::Str)
        .build()
}

fn delete_options() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("V1DeleteOptions")
        .optional("api_version", "apiVersion", DeclaredType::Str)
        .optional("kind", "kind", DeclaredType::Str)
        .optional("grace_period_seconds", "gracePeriodSeconds", DeclaredType::Long)
        .optional("propagation_policy", "propagationPolicy", DeclaredType::Str)
        .optional("preconditions", "preconditions", DeclaredType::Named("V1Preconditions"))
        .optional("dry_run", "dryRun", DeclaredType::List(Box::new(DeclaredType::Str)))
        .build()
}

/// Resolve a watch/list event's concrete subtype from `apiVersion`/`kind`,
/// restricted to the types this crate actually registers.
pub fn watch_object_discriminator(wire: &serde_json::Value) -> Option<&'static str> {
    gvk::resolve_against(wire, &["V1Pod", "V1Namespace"])
}

/// An umbrella schema for a polymorphic watch/list item: carries no
/// attributes of its own, and instead resolves to `V1Pod` or `V1Namespace`
/// via [`watch_object_discriminator`] depending on the wire object's
/// `apiVersion`/`kind`. Exercises the discriminator dispatch branch in
/// [`crate::serializer::from_wire`] end-to-end, the way a generated
/// client's `WatchEvent<DynamicObject>` would.
fn watch_object() -> crate::schema::SchemaDescriptor {
    SchemaDescriptorBuilder::new("WatchObject")
        .discriminator(watch_object_discriminator)
        .build()
}

fn build_registry() -> SchemaRegistry {
    let mut reg = SchemaRegistry::new();
    for s in [
        object_meta(),
        list_meta(),
        container(),
        pod_spec(),
        pod_status(),
        pod(),
        pod_list(),
        namespace_spec(),
        namespace_status(),
        namespace(),
        namespace_list(),
        preconditions(),
        delete_options(),
        watch_object(),
    ] {
        reg.register(s);
    }
    for s in response::schemas() {
        reg.register(s);
    }
    reg
}

/// The process-wide schema registry, built once on first use.
pub static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(build_registry);

/// Convenience re-export so callers can decode a watch line against the
/// process-wide registry without threading it through explicitly.
pub fn decode_watch_line(object_type: &'static str, line: &[u8]) -> watch::WatchEvent {
    watch::decode_line(&REGISTRY, object_type, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_representative_types() {
        assert!(REGISTRY.contains("V1Pod"));
        assert!(REGISTRY.contains("V1Namespace"));
        assert!(REGISTRY.contains("V1ObjectMeta"));
        assert!(REGISTRY.contains("V1Status"));
    }

    #[test]
    fn gvk_discriminator_resolves_registered_kind() {
        let wire = serde_json::json!({"apiVersion": "v1", "kind": "Pod"});
        assert_eq!(watch_object_discriminator(&wire), Some("V1Pod"));
    }

    #[test]
    fn gvk_discriminator_rejects_unregistered_kind() {
        let wire = serde_json::json!({"apiVersion": "apps/v1", "kind": "Deployment"});
        assert_eq!(watch_object_discriminator(&wire), None);
    }

    #[test]
    fn delete_options_round_trips_spec_example() {
        use crate::serializer::{from_wire, to_wire};
        use crate::value::DomainObjectBuilder;

        let obj = DomainObjectBuilder::new(&REGISTRY, "V1DeleteOptions")
            .attr("api_version", crate::value::AttrValue::Str("v1".into()))
            .attr("kind", crate::value::AttrValue::Str("DeleteOptions".into()))
            .attr("grace_period_seconds", crate::value::AttrValue::Int(0))
            .attr("propagation_policy", crate::value::AttrValue::Str("Foreground".into()))
            .finish()
            .unwrap();

        let wire = to_wire(&REGISTRY, &obj).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "DeleteOptions",
                "gracePeriodSeconds": 0,
                "propagationPolicy": "Foreground",
            })
        );

        let decoded = from_wire(&REGISTRY, "V1DeleteOptions", &wire).unwrap();
        assert_eq!(decoded, crate::value::AttrValue::Object(obj));
    }

    #[test]
    fn watch_object_discriminator_is_reachable_through_from_wire() {
        use crate::serializer::from_wire;

        let wire = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "test0"},
        });
        let decoded = from_wire(&REGISTRY, "WatchObject", &wire).unwrap();
        let crate::value::AttrValue::Object(obj) = decoded else { panic!("expected object") };
        assert_eq!(obj.type_name(), "V1Pod");
        let Some(crate::value::AttrValue::Object(metadata)) = obj.get("metadata") else {
            panic!("expected metadata")
        };
        assert_eq!(metadata.get("name"), Some(&crate::value::AttrValue::Str("test0".into())));
    }

    #[test]
    fn watch_object_discriminator_unresolved_falls_back_to_empty_schema() {
        use crate::serializer::from_wire;

        let wire = serde_json::json!({"apiVersion": "apps/v1", "kind": "Deployment"});
        let decoded = from_wire(&REGISTRY, "WatchObject", &wire).unwrap();
        let crate::value::AttrValue::Object(obj) = decoded else { panic!("expected object") };
        assert_eq!(obj.type_name(), "WatchObject");
    }
}
