use crate::support;
use shellhub_kernel::{Outcome, Settings};
use shellhub_router::TenantRouter;

pub fn run(settings: &Settings, path: String, json: bool) {
    let router = TenantRouter::from_settings(&settings.router);
    let outcome = Outcome::ok(router.route(&path));
    support::emit("route", &outcome, json, |routed| {
        let mut lines = vec![
            format!("Route: {}", routed.route.as_str()),
            format!("Rewritten: {}", routed.rewritten_path),
        ];
        if let Some(shell_id) = &routed.context.shell_id {
            lines.push(format!("Shell: {shell_id}"));
        }
        if let Some(submodel_id) = &routed.context.submodel_id {
            lines.push(format!("Submodel: {submodel_id}"));
        }
        if let Some(element_path) = &routed.context.element_path {
            lines.push(format!("Element path: {element_path}"));
        }
        for (key, value) in &routed.query {
            lines.push(format!("Query: {key}={value}"));
        }
        lines
    });
}
