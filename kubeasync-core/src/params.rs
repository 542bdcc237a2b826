//! Query/body parameter shapes for list, watch, create, patch, and delete
//! calls, ported from apimachinery's `*Options` types the same way the
//! generated client's keyword arguments are, but collected into builders.
use crate::error::{Error, Result};
use serde_json::Value;

/// Common query parameters used in watch/list calls on collections.
#[derive(Clone, Debug)]
pub struct ListParams {
    /// Restrict results by label. `None` means everything.
    pub label_selector: Option<String>,
    /// Restrict results by field. `None` means everything.
    pub field_selector: Option<String>,
    /// Limit the number of results per page.
    pub limit: Option<u32>,
    /// Continue token from a previous paginated list call.
    pub continue_token: Option<String>,
    /// Only return objects created at or after this resource version.
    pub resource_version: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            label_selector: None,
            field_selector: None,
            limit: None,
            continue_token: None,
            resource_version: None,
        }
    }
}

impl ListParams {
    /// Restrict results by label selector (`key1=value1,key2=value2`).
    #[must_use]
    pub fn labels(mut self, label_selector: &str) -> Self {
        self.label_selector = Some(label_selector.to_string());
        self
    }

    /// Restrict results by field selector.
    #[must_use]
    pub fn fields(mut self, field_selector: &str) -> Self {
        self.field_selector = Some(field_selector.to_string());
        self
    }

    /// Cap the number of results returned per page.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resume a paginated list from a previous continue token.
    #[must_use]
    pub fn continue_token(mut self, token: &str) -> Self {
        self.continue_token = Some(token.to_string());
        self
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(ls) = &self.label_selector {
            qp.append_pair("labelSelector", ls);
        }
        if let Some(fs) = &self.field_selector {
            qp.append_pair("fieldSelector", fs);
        }
        if let Some(limit) = &self.limit {
            qp.append_pair("limit", &limit.to_string());
        }
        if let Some(cont) = &self.continue_token {
            qp.append_pair("continue", cont);
        }
        if let Some(rv) = &self.resource_version {
            qp.append_pair("resourceVersion", rv);
        }
    }
}

/// Query parameters specific to a watch call, layered on top of
/// [`ListParams`]'s selectors.
#[derive(Clone, Debug, Default)]
pub struct WatchParams {
    /// Selector/pagination parameters shared with list calls.
    pub list: ListParams,
    /// Caps the duration of the call. The server may cut the stream
    /// earlier; clients should reconnect on stream end regardless.
    ///
    /// Capped at 295s to stay under the typical apiserver watch deadline
    /// (<https://github.com/kubernetes/kubernetes/issues/6513>).
    pub timeout_seconds: Option<u32>,
    /// Request `BOOKMARK` events carrying only an updated resource version.
    pub bookmarks: bool,
}

impl WatchParams {
    /// Set the watch call's timeout in seconds; rejected by [`validate`](Self::validate) if `>= 295`.
    #[must_use]
    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout_seconds = Some(secs);
        self
    }

    /// Request bookmark events.
    #[must_use]
    pub fn bookmarks(mut self) -> Self {
        self.bookmarks = true;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(t) = self.timeout_seconds {
            if t >= 295 {
                return Err(Error::TypeMismatch {
                    type_name: "WatchParams".into(),
                    expected: "timeoutSeconds < 295",
                    found: "timeoutSeconds >= 295",
                });
            }
        }
        Ok(())
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        self.list.populate_qp(qp);
        qp.append_pair("watch", "true");
        if let Some(t) = self.timeout_seconds {
            qp.append_pair("timeoutSeconds", &t.to_string());
        }
        qp.append_pair("allowWatchBookmarks", if self.bookmarks { "true" } else { "false" });
    }
}

/// Common query parameters for create (`POST`) calls.
#[derive(Clone, Debug, Default)]
pub struct PostParams {
    /// Persist nothing; report what would have happened.
    pub dry_run: bool,
    /// Name of the actor making the change, recorded in `managedFields`.
    pub field_manager: Option<String>,
}

impl PostParams {
    /// Perform a dry run only.
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Set the field manager.
    #[must_use]
    pub fn field_manager(mut self, manager: &str) -> Self {
        self.field_manager = Some(manager.to_string());
        self
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.dry_run {
            qp.append_pair("dryRun", "All");
        }
        if let Some(fm) = &self.field_manager {
            qp.append_pair("fieldManager", fm);
        }
    }
}

/// The validation directive used for `fieldValidation` during server-side apply.
#[derive(Clone, Debug)]
pub enum ValidationDirective {
    /// Reject the request if any field would be dropped or duplicated.
    Strict,
    /// Accept the request, warning about dropped/duplicate fields.
    Warn,
    /// Accept the request silently.
    Ignore,
}

impl ValidationDirective {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Warn => "Warn",
            Self::Ignore => "Ignore",
        }
    }
}

/// Describes changes that should be applied to a resource, carrying a
/// pre-encoded wire body for each merge strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// [Server-side apply](https://kubernetes.io/docs/reference/using-api/api-concepts/#server-side-apply).
    Apply(Value),
    /// [JSON patch](https://www.rfc-editor.org/rfc/rfc6902) (an array of operations).
    Json(Value),
    /// [JSON merge patch](https://www.rfc-editor.org/rfc/rfc7386).
    Merge(Value),
    /// Kubernetes' strategic merge patch.
    Strategic(Value),
}

impl Patch {
    pub(crate) fn is_apply(&self) -> bool {
        matches!(self, Patch::Apply(_))
    }

    pub(crate) fn content_type(&self) -> &'static str {
        match self {
            Self::Apply(_) => "application/apply-patch+yaml",
            Self::Json(_) => "application/json-patch+json",
            Self::Merge(_) => "application/merge-patch+json",
            Self::Strategic(_) => "application/strategic-merge-patch+json",
        }
    }

    pub(crate) fn body(&self) -> Result<Vec<u8>> {
        let value = match self {
            Self::Apply(v) | Self::Json(v) | Self::Merge(v) | Self::Strategic(v) => v,
        };
        serde_json::to_vec(value).map_err(Error::Json)
    }
}

/// Common query parameters for patch calls.
#[derive(Clone, Debug, Default)]
pub struct PatchParams {
    /// Persist nothing; report what would have happened.
    pub dry_run: bool,
    /// Force an apply through field-manager conflicts. Only valid with [`Patch::Apply`].
    pub force: bool,
    /// Name of the actor making the change. Required for [`Patch::Apply`].
    pub field_manager: Option<String>,
    /// Server-side validation directive. Only applies to [`Patch::Apply`].
    pub field_validation: Option<ValidationDirective>,
}

impl PatchParams {
    /// Construct params for a server-side apply, setting the field manager.
    pub fn apply(manager: &str) -> Self {
        Self {
            field_manager: Some(manager.to_string()),
            ..Self::default()
        }
    }

    /// Force the apply through field-manager conflicts.
    #[must_use]
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Perform a dry run only.
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Set the server-side validation directive.
    #[must_use]
    pub fn validation(mut self, vd: ValidationDirective) -> Self {
        self.field_validation = Some(vd);
        self
    }

    pub(crate) fn validate(&self, patch: &Patch) -> Result<()> {
        if self.force && !patch.is_apply() {
            return Err(Error::TypeMismatch {
                type_name: "PatchParams".into(),
                expected: "Patch::Apply when force is set",
                found: "a non-apply patch",
            });
        }
        Ok(())
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.dry_run {
            qp.append_pair("dryRun", "All");
        }
        if self.force {
            qp.append_pair("force", "true");
        }
        if let Some(fm) = &self.field_manager {
            qp.append_pair("fieldManager", fm);
        }
        if let Some(fv) = &self.field_validation {
            qp.append_pair("fieldValidation", fv.as_str());
        }
    }
}

/// Propagation policy when deleting a single object.
#[derive(Clone, Debug)]
pub enum PropagationPolicy {
    /// Orphan dependents.
    Orphan,
    /// Let the garbage collector delete dependents in the background.
    Background,
    /// Cascade and delete all dependents before returning.
    Foreground,
}

impl PropagationPolicy {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Orphan => "Orphan",
            Self::Background => "Background",
            Self::Foreground => "Foreground",
        }
    }
}

/// Conditions that must hold before a delete is carried out; a `409
/// Conflict` is returned otherwise.
#[derive(Clone, Debug, Default)]
pub struct Preconditions {
    /// Required resource version.
    pub resource_version: Option<String>,
    /// Required UID.
    pub uid: Option<String>,
}

/// Common body/query parameters for delete calls.
#[derive(Clone, Debug, Default)]
pub struct DeleteParams {
    /// Persist nothing; report what would have happened.
    pub dry_run: bool,
    /// Seconds before the object should be deleted; `None` uses the
    /// type's default grace period.
    pub grace_period_seconds: Option<u32>,
    /// How dependents are garbage collected.
    pub propagation_policy: Option<PropagationPolicy>,
    /// Conditions the target object must satisfy.
    pub preconditions: Option<Preconditions>,
}

impl DeleteParams {
    /// `PropagationPolicy::Background`.
    pub fn background() -> Self {
        Self {
            propagation_policy: Some(PropagationPolicy::Background),
            ..Self::default()
        }
    }

    /// `PropagationPolicy::Foreground`.
    pub fn foreground() -> Self {
        Self {
            propagation_policy: Some(PropagationPolicy::Foreground),
            ..Self::default()
        }
    }

    /// Body encoded as a `DeleteOptions` JSON object: delete calls carry an
    /// options body, not just query parameters.
    pub(crate) fn body(&self) -> Vec<u8> {
        let mut obj = serde_json::Map::new();
        if self.dry_run {
            obj.insert("dryRun".into(), Value::Array(vec![Value::String("All".into())]));
        }
        if let Some(g) = self.grace_period_seconds {
            obj.insert("gracePeriodSeconds".into(), Value::from(g));
        }
        if let Some(p) = &self.propagation_policy {
            obj.insert("propagationPolicy".into(), Value::String(p.as_str().into()));
        }
        if let Some(pre) = &self.preconditions {
            let mut pre_obj = serde_json::Map::new();
            if let Some(rv) = &pre.resource_version {
                pre_obj.insert("resourceVersion".into(), Value::String(rv.clone()));
            }
            if let Some(uid) = &pre.uid {
                pre_obj.insert("uid".into(), Value::String(uid.clone()));
            }
            obj.insert("preconditions".into(), Value::Object(pre_obj));
        }
        serde_json::to_vec(&Value::Object(obj)).expect("map of primitives always serializes")
    }
}

/// Per-request overrides that don't fit list/watch/patch/delete params:
/// response rendering and content negotiation.
#[derive(Clone, Debug, Default)]
pub struct ApiOptions {
    /// Ask the server for a human-readable response body.
    pub pretty: bool,
    /// When `false`, the caller only wants the response status, not a
    /// decoded body (mirrors the generated client's `_preload_content`).
    pub preload_content: bool,
}

impl ApiOptions {
    /// Request pretty-printed responses.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Skip decoding the response body.
    #[must_use]
    pub fn without_preload(mut self) -> Self {
        self.preload_content = false;
        self
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.pretty {
            qp.append_pair("pretty", "true");
        }
    }
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            preload_content: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_params_background_body() {
        let dp = DeleteParams::background();
        let body: Value = serde_json::from_slice(&dp.body()).unwrap();
        assert_eq!(body, serde_json::json!({"propagationPolicy": "Background"}));
    }

    #[test]
    fn watch_params_rejects_long_timeout() {
        let wp = WatchParams::default().timeout(300);
        assert!(wp.validate().is_err());
    }

    #[test]
    fn patch_params_rejects_force_without_apply() {
        let pp = PatchParams::default().force();
        let patch = Patch::Merge(serde_json::json!({}));
        assert!(pp.validate(&patch).is_err());
    }

    #[test]
    fn patch_content_types() {
        assert_eq!(Patch::Apply(Value::Null).content_type(), "application/apply-patch+yaml");
        assert_eq!(Patch::Merge(Value::Null).content_type(), "application/merge-patch+json");
    }

    #[test]
    fn api_options_pretty_populates_query_param() {
        let mut qp = form_urlencoded::Serializer::new(String::new());
        ApiOptions::default().pretty().populate_qp(&mut qp);
        assert_eq!(qp.finish(), "pretty=true");
    }

    #[test]
    fn api_options_default_emits_no_query_param() {
        let mut qp = form_urlencoded::Serializer::new(String::new());
        ApiOptions::default().populate_qp(&mut qp);
        assert_eq!(qp.finish(), "");
    }
}
