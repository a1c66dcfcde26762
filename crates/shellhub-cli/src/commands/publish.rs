use crate::support;
use shellhub_kernel::{Outcome, Settings, ShellDescriptor};
use shellhub_provider::sample;
use tracing::warn;

/// Publish every hosted sample shell into the registry.
///
/// Stops at the first failing shell; shells written before it stay
/// registered.
pub fn run(settings: &Settings, base_urls: Vec<String>, shells: usize, json: bool) {
    let store = support::open_store_or_exit(settings);
    let repository = sample::repository(shells);

    let mut published: Vec<ShellDescriptor> = Vec::new();
    let mut outcome = None;
    for descriptor in repository.descriptors(&base_urls) {
        let created = store.create_shell(descriptor);
        if !created.success {
            warn!(
                published = published.len(),
                "publish stopped at the first failing shell"
            );
            outcome = Some(created.map(|shell| vec![shell]));
            break;
        }
        published.extend(created.payload);
    }
    let outcome = outcome.unwrap_or_else(|| Outcome::ok(published));

    support::emit("publish", &outcome, json, |shells| {
        let mut lines = vec![format!("Published: {}", shells.len())];
        lines.extend(shells.iter().map(|shell| {
            let endpoint = shell
                .endpoints
                .first()
                .map(|e| e.address.as_str())
                .unwrap_or("-");
            format!("- {} -> {endpoint}", shell.id_short)
        }));
        lines
    });
}
