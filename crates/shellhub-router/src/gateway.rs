//! Static dispatch of routed requests onto live providers.
//!
//! Element routes, relative to the routed submodel:
//!
//! | path                                              | methods      |
//! |---------------------------------------------------|--------------|
//! | `submodel`                                        | GET          |
//! | `submodel/values`                                 | GET          |
//! | `submodel/submodelElements`                       | GET          |
//! | `submodel/submodelElements/{path}`                | GET          |
//! | `submodel/submodelElements/{path}/value`          | GET, PUT     |
//! | `submodel/submodelElements/{path}/invoke`         | POST         |
//! | `submodel/submodelElements/{path}/invocationList/{requestId}` | GET, DELETE |

use crate::router::{CanonicalRoute, RoutedRequest, TenantRouter};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shellhub_kernel::{Outcome, ShellhubError};
use shellhub_provider::{
    InvocationRequest, ProviderAggregator, ShellProvider, SubmodelProvider,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ShellhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            other => Err(ShellhubError::validation(format!(
                "unsupported method `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::Delete, target)
    }

    pub fn put(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, target).with_body(body)
    }

    pub fn post(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, target).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What an element path under `submodel/` addresses.
#[derive(Debug, PartialEq, Eq)]
enum ElementRoute<'a> {
    Submodel,
    Values,
    Elements,
    Element(String),
    Value(String),
    Invoke(String),
    Invocation(String, &'a str),
}

fn parse_element_route(path: &str) -> Option<ElementRoute<'_>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["submodel"] => Some(ElementRoute::Submodel),
        ["submodel", "values"] => Some(ElementRoute::Values),
        ["submodel", "submodelElements"] => Some(ElementRoute::Elements),
        ["submodel", "submodelElements", rest @ ..] => Some(match rest {
            [element @ .., "value"] if !element.is_empty() => {
                ElementRoute::Value(element.join("/"))
            }
            [element @ .., "invoke"] if !element.is_empty() => {
                ElementRoute::Invoke(element.join("/"))
            }
            [element @ .., "invocationList", request_id] if !element.is_empty() => {
                ElementRoute::Invocation(element.join("/"), *request_id)
            }
            element => ElementRoute::Element(element.join("/")),
        }),
        _ => None,
    }
}

pub struct Gateway {
    router: TenantRouter,
    aggregator: Arc<ProviderAggregator>,
}

impl Gateway {
    pub fn new(router: TenantRouter, aggregator: Arc<ProviderAggregator>) -> Self {
        Self { router, aggregator }
    }

    /// Route `request` and run it against the hosted providers.
    pub async fn handle(&self, request: Request, cancel: CancellationToken) -> Outcome<Value> {
        let routed = self.router.route(&request.target);
        debug!(
            method = request.method.as_str(),
            route = routed.route.as_str(),
            "dispatching"
        );
        match routed.route {
            CanonicalRoute::Default => match require(&request, &[Method::Get], &routed) {
                Ok(()) => Outcome::ok(json!({ "shells": self.aggregator.shell_ids() })),
                Err(err) => Outcome::failure(err),
            },
            CanonicalRoute::ShellEntry | CanonicalRoute::ShellDetail => {
                self.with_shell(&request, &routed, |shell| into_json(Outcome::ok(shell.summary())))
            }
            CanonicalRoute::SubmodelList => self.with_shell(&request, &routed, |shell| {
                into_json(Outcome::ok(shell.submodel_summaries()))
            }),
            CanonicalRoute::SubmodelDetail => self.with_shell(&request, &routed, |shell| {
                let submodel = submodel_for(shell, &routed);
                into_json(Outcome::ok(submodel.summary()))
            }),
            CanonicalRoute::Element => self.handle_element(request, &routed, cancel).await,
            CanonicalRoute::Passthrough => Outcome::failure(ShellhubError::not_found(format!(
                "no route for `{}`",
                routed.rewritten_path
            ))),
        }
    }

    fn with_shell(
        &self,
        request: &Request,
        routed: &RoutedRequest,
        f: impl FnOnce(&ShellProvider) -> Outcome<Value>,
    ) -> Outcome<Value> {
        if let Err(err) = require(request, &[Method::Get], routed) {
            return Outcome::failure(err);
        }
        match self.shell_for(routed) {
            Ok(shell) => f(&shell),
            Err(err) => Outcome::failure(err),
        }
    }

    fn shell_for(&self, routed: &RoutedRequest) -> Result<Arc<ShellProvider>, ShellhubError> {
        let shell_id = routed.context.shell_id.as_deref().unwrap_or_default();
        self.aggregator
            .lookup_shell_provider(shell_id)
            .into_result()?
            .ok_or_else(|| ShellhubError::not_found(format!("shell `{shell_id}`")))
    }

    async fn handle_element(
        &self,
        request: Request,
        routed: &RoutedRequest,
        cancel: CancellationToken,
    ) -> Outcome<Value> {
        let element_path = routed.context.element_path.as_deref().unwrap_or_default();
        let Some(element_route) = parse_element_route(element_path) else {
            return Outcome::failure(ShellhubError::not_found(format!(
                "no element route for `{element_path}`"
            )));
        };
        let shell = match self.shell_for(routed) {
            Ok(shell) => shell,
            Err(err) => return Outcome::failure(err),
        };
        let submodel = submodel_for(&shell, routed);

        match element_route {
            ElementRoute::Submodel => get_only(&request, routed, || {
                into_json(Outcome::ok(submodel.summary()))
            }),
            ElementRoute::Values => get_only(&request, routed, || submodel.values()),
            ElementRoute::Elements => get_only(&request, routed, || {
                into_json(Outcome::ok(submodel.element_summaries()))
            }),
            ElementRoute::Element(path) => get_only(&request, routed, || {
                into_json(submodel.element_summary(&path))
            }),
            ElementRoute::Value(path) => match request.method {
                Method::Get => submodel.read_value(&path),
                Method::Put => match &request.body {
                    Some(body) => into_json(submodel.write_value(&path, body)),
                    None => Outcome::failure(ShellhubError::validation(
                        "PUT on a value requires a body",
                    )),
                },
                _ => Outcome::failure(not_allowed(&request, routed)),
            },
            ElementRoute::Invoke(path) => {
                if request.method != Method::Post {
                    return Outcome::failure(not_allowed(&request, routed));
                }
                let invocation = match parse_invocation(request.body) {
                    Ok(invocation) => invocation,
                    Err(err) => return Outcome::failure(err),
                };
                if routed.query_flag("async") {
                    into_json(submodel.start_invocation(&path, invocation))
                } else {
                    into_json(submodel.invoke(&path, invocation, cancel).await)
                }
            }
            ElementRoute::Invocation(path, request_id) => match request.method {
                Method::Get => into_json(submodel.invocation_status(&path, request_id)),
                Method::Delete => into_json(submodel.cancel_invocation(&path, request_id)),
                _ => Outcome::failure(not_allowed(&request, routed)),
            },
        }
    }
}

/// The hosted submodel, or an empty stand-in when nothing live is bound.
fn submodel_for(shell: &ShellProvider, routed: &RoutedRequest) -> Arc<SubmodelProvider> {
    let submodel_id = routed.context.submodel_id.as_deref().unwrap_or_default();
    shell.submodel_or_empty(submodel_id)
}

fn require(
    request: &Request,
    allowed: &[Method],
    routed: &RoutedRequest,
) -> Result<(), ShellhubError> {
    if allowed.contains(&request.method) {
        Ok(())
    } else {
        Err(not_allowed(request, routed))
    }
}

fn get_only(
    request: &Request,
    routed: &RoutedRequest,
    f: impl FnOnce() -> Outcome<Value>,
) -> Outcome<Value> {
    match require(request, &[Method::Get], routed) {
        Ok(()) => f(),
        Err(err) => Outcome::failure(err),
    }
}

fn not_allowed(request: &Request, routed: &RoutedRequest) -> ShellhubError {
    ShellhubError::validation(format!(
        "method {} is not allowed on `{}`",
        request.method, routed.rewritten_path
    ))
}

fn parse_invocation(body: Option<Value>) -> Result<InvocationRequest, ShellhubError> {
    match body {
        None | Some(Value::Null) => Ok(InvocationRequest::default()),
        Some(body) => serde_json::from_value(body).map_err(|err| {
            ShellhubError::validation(format!("malformed invocation request: {err}"))
        }),
    }
}

fn into_json<T: Serialize>(outcome: Outcome<T>) -> Outcome<Value> {
    let Outcome {
        success,
        message,
        payload,
    } = outcome;
    match payload.map(serde_json::to_value).transpose() {
        Ok(payload) => Outcome {
            success,
            message,
            payload,
        },
        Err(err) => Outcome::failure(ShellhubError::io(format!("cannot encode payload: {err}"))),
    }
}
