//! Resolves a `(apiVersion, kind)` pair to a registry type name, following
//! the generated client's naming convention: capitalize each `/`-separated
//! segment of `apiVersion` and concatenate (`"v1"` → `"V1"`,
//! `"extensions/v1beta1"` → `"ExtensionsV1beta1"`), then append `kind` with
//! its first character capitalized, turning a trailing `list` suffix into
//! `List` (`"Podlist"` → `"PodList"`).
//!
//! Generated client types follow the same flattening of API groups into a
//! single type namespace but don't need a runtime version of it since the
//! mapping is baked into each generated struct at compile time.

/// Build the registry type name for a `(api_version, kind)` pair.
pub fn type_name_for(api_version: &str, kind: &str) -> String {
    let version_prefix: String = api_version.split('/').map(capitalize_first).collect();
    format!("{}{}", version_prefix, capitalize_kind(kind))
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Capitalize `kind`'s first character, then capitalize a trailing `list`
/// suffix (case-insensitive) to `List`.
fn capitalize_kind(kind: &str) -> String {
    let capitalized = capitalize_first(kind);
    if capitalized.len() > 4 && capitalized[capitalized.len() - 4..].eq_ignore_ascii_case("list") {
        format!("{}List", &capitalized[..capitalized.len() - 4])
    } else {
        capitalized
    }
}

/// Resolve `(apiVersion, kind)` found on a wire object against a fixed set
/// of candidate registry names, returning the matching `'static` handle.
///
/// [`crate::schema::DiscriminatorFn`] requires a `&'static str` result, but
/// [`type_name_for`] computes a `String` at decode time; this bridges the
/// two without leaking memory by matching the computed name against
/// `candidates` (the small, fixed list of subtypes a given polymorphic
/// attribute can actually resolve to) and returning the pre-existing
/// static from that list.
pub fn resolve_against(wire: &serde_json::Value, candidates: &[&'static str]) -> Option<&'static str> {
    let obj = wire.as_object()?;
    let api_version = obj.get("apiVersion")?.as_str()?;
    let kind = obj.get("kind")?.as_str()?;
    let computed = type_name_for(api_version, kind);
    candidates.iter().copied().find(|c| **c == computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_core_version() {
        assert_eq!(type_name_for("V1", "Pod"), "V1Pod");
        assert_eq!(type_name_for("v1", "Namespace"), "V1Namespace");
    }

    #[test]
    fn grouped_version_capitalizes_each_segment() {
        assert_eq!(type_name_for("Extensions/v1beta1", "Deployment"), "ExtensionsV1beta1Deployment");
    }

    #[test]
    fn beta_version_preserved() {
        assert_eq!(type_name_for("v1beta1", "Ingress"), "V1beta1Ingress");
    }

    #[test]
    fn list_suffix_is_capitalized() {
        assert_eq!(type_name_for("V1", "Podlist"), "V1PodList");
        assert_eq!(type_name_for("V1", "Namespacelist"), "V1NamespaceList");
    }

    #[test]
    fn delete_options_unaffected() {
        assert_eq!(type_name_for("V1", "DeleteOptions"), "V1DeleteOptions");
    }
}
