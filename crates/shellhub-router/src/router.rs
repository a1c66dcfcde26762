//! Tenant path rewriting.
//!
//! `TenantRouter` holds configuration only. Everything resolved for a
//! request lives in the `RoutedRequest` it returns.

use serde::Serialize;
use shellhub_kernel::RouterSettings;
use std::collections::BTreeMap;
use tracing::debug;

/// Third segment addressing the shell itself.
pub const SHELL_KEYWORD: &str = "aas";
/// Fourth segment addressing the submodel list.
pub const SUBMODELS_KEYWORD: &str = "submodels";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalRoute {
    /// No segments: the configured landing route.
    Default,
    /// `/{any}/{shell}`
    ShellEntry,
    /// `/{any}/{shell}/aas`
    ShellDetail,
    /// `/{any}/{shell}/aas/submodels`
    SubmodelList,
    /// `/{any}/{shell}/aas/submodels/{sm}`
    SubmodelDetail,
    /// `/{any}/{shell}/aas/submodels/{sm}/{element..}`
    Element,
    /// Unrecognized shape, left as is.
    Passthrough,
}

impl CanonicalRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ShellEntry => "shellEntry",
            Self::ShellDetail => "shellDetail",
            Self::SubmodelList => "submodelList",
            Self::SubmodelDetail => "submodelDetail",
            Self::Element => "element",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Identifiers resolved for exactly one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submodel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedRequest {
    pub route: CanonicalRoute,
    pub context: RequestContext,
    pub rewritten_path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

impl RoutedRequest {
    pub fn query_flag(&self, name: &str) -> bool {
        self.query
            .get(name)
            .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true") || v == "1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRouter {
    default_route: String,
}

impl Default for TenantRouter {
    fn default() -> Self {
        Self::from_settings(&RouterSettings::default())
    }
}

impl TenantRouter {
    pub fn new(default_route: impl Into<String>) -> Self {
        Self {
            default_route: default_route.into(),
        }
    }

    pub fn from_settings(settings: &RouterSettings) -> Self {
        Self::new(settings.default_route.clone())
    }

    pub fn default_route(&self) -> &str {
        &self.default_route
    }

    /// Rewrite `target` (path plus optional `?query`).
    pub fn route(&self, target: &str) -> RoutedRequest {
        let (path, query) = split_target(target);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut context = RequestContext::default();
        if segments.len() >= 2 {
            context.shell_id = Some(segments[1].to_string());
        }
        if segments.len() >= 5 {
            context.submodel_id = Some(segments[4].to_string());
        }

        let (route, rewritten_path) = match segments.as_slice() {
            [] => (CanonicalRoute::Default, self.default_route.clone()),
            [_, shell] => (CanonicalRoute::ShellEntry, format!("/shells/{shell}")),
            [_, _, keyword] if *keyword == SHELL_KEYWORD => {
                (CanonicalRoute::ShellDetail, "/aas".to_string())
            }
            [_, _, _, keyword] if *keyword == SUBMODELS_KEYWORD => {
                (CanonicalRoute::SubmodelList, "/aas/submodels".to_string())
            }
            [_, _, _, _, submodel] => (
                CanonicalRoute::SubmodelDetail,
                format!("/aas/submodels/{submodel}"),
            ),
            [_, _, _, _, _, rest @ ..] => {
                let element_path = rest.join("/");
                let rewritten = format!("/{element_path}");
                context.element_path = Some(element_path);
                (CanonicalRoute::Element, rewritten)
            }
            _ => (CanonicalRoute::Passthrough, path.to_string()),
        };

        debug!(
            path = target,
            route = route.as_str(),
            rewritten = rewritten_path.as_str(),
            shell = context.shell_id.as_deref().unwrap_or_default(),
            "routed"
        );

        RoutedRequest {
            route,
            context,
            rewritten_path,
            query: parse_query_params(query),
        }
    }
}

fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

fn parse_query_params(query: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        let key = percent_decode(k);
        if key.is_empty() {
            continue;
        }
        out.insert(key, percent_decode(v));
    }
    out
}

/// Decode `%XX` escapes and `+`. Invalid escapes are kept literally and
/// invalid UTF-8 is replaced.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(h), Some(l)) => {
                        out.push(h * 16 + l);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> TenantRouter {
        TenantRouter::new("/MultiIndex")
    }

    #[test]
    fn empty_path_goes_to_default_route() {
        for target in ["", "/", "//", "/?x=1"] {
            let routed = router().route(target);
            assert_eq!(routed.route, CanonicalRoute::Default, "target {target:?}");
            assert_eq!(routed.rewritten_path, "/MultiIndex");
            assert_eq!(routed.context, RequestContext::default());
        }
    }

    #[test]
    fn unrecognized_shapes_pass_through_with_shell_context() {
        let single = router().route("/healthz");
        assert_eq!(single.route, CanonicalRoute::Passthrough);
        assert_eq!(single.rewritten_path, "/healthz");
        assert_eq!(single.context.shell_id, None);

        let odd = router().route("/t/shellA/other");
        assert_eq!(odd.route, CanonicalRoute::Passthrough);
        assert_eq!(odd.rewritten_path, "/t/shellA/other");
        assert_eq!(odd.context.shell_id.as_deref(), Some("shellA"));
    }

    #[test]
    fn query_is_split_and_decoded() {
        let routed = router().route("/t/shellA/aas/submodels/sm1/x/invoke?async=true&note=a%20b+c");
        assert_eq!(routed.query.get("async").map(String::as_str), Some("true"));
        assert_eq!(routed.query.get("note").map(String::as_str), Some("a b c"));
        assert!(routed.query_flag("async"));
        assert!(!routed.query_flag("missing"));
        assert_eq!(routed.context.element_path.as_deref(), Some("x/invoke"));
    }

    #[test]
    fn percent_decode_works_for_common_forms() {
        assert_eq!(percent_decode("needs%2Dattention"), "needs-attention");
        assert_eq!(percent_decode("i1+test"), "i1 test");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
    }
}
