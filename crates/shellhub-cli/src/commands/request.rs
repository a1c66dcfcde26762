use crate::cli::MethodArg;
use crate::support;
use serde_json::Value;
use shellhub_kernel::{Outcome, Settings, ShellhubError};
use shellhub_provider::sample;
use shellhub_router::{Gateway, Method, Request, TenantRouter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Args {
    pub path: String,
    pub method: MethodArg,
    pub body: Option<String>,
    pub shells: usize,
    pub json: bool,
}

pub fn run(settings: &Settings, args: Args) {
    let body = match args.body.as_deref().map(serde_json::from_str::<Value>).transpose() {
        Ok(body) => body,
        Err(e) => {
            let outcome: Outcome<Value> =
                Outcome::failure(ShellhubError::validation(format!("malformed --body: {e}")));
            support::emit("request", &outcome, args.json, |_| Vec::new());
            return;
        }
    };

    let gateway = Gateway::new(
        TenantRouter::from_settings(&settings.router),
        Arc::new(sample::repository(args.shells)),
    );
    let mut request = Request::new(map_method(args.method), args.path);
    request.body = body;

    let runtime = support::new_runtime_or_exit();
    let outcome = runtime.block_on(async move {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling request");
                on_interrupt.cancel();
            }
        });
        gateway.handle(request, cancel).await
    });

    support::emit("request", &outcome, args.json, |payload| {
        vec![serde_json::to_string_pretty(payload).expect("json serialization")]
    });
}

fn map_method(arg: MethodArg) -> Method {
    match arg {
        MethodArg::Get => Method::Get,
        MethodArg::Put => Method::Put,
        MethodArg::Post => Method::Post,
        MethodArg::Delete => Method::Delete,
    }
}
