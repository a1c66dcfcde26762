//! A live submodel: element tree plus its background invocations.

use crate::element::{self, ElementSummary, SubmodelElement};
use crate::invocation_table::{InvocationStatus, InvocationTable};
use crate::invoker;
use crate::operation::{InvocationRequest, InvocationResponse, Operation};
use serde::Serialize;
use serde_json::Value;
use shellhub_kernel::{Endpoint, Identifier, Outcome, ShellhubError, SubmodelDescriptor};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelSummary {
    pub id_short: String,
    pub identification: Identifier,
    pub element_count: usize,
}

#[derive(Debug)]
pub struct SubmodelProvider {
    id_short: String,
    identifier: Identifier,
    elements: Vec<SubmodelElement>,
    invocations: InvocationTable,
}

impl SubmodelProvider {
    pub fn new(id_short: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            id_short: id_short.into(),
            identifier,
            elements: Vec::new(),
            invocations: InvocationTable::new(),
        }
    }

    /// A provider with no elements, used when nothing live is bound.
    pub fn empty(id_short: impl Into<String>) -> Self {
        let id_short = id_short.into();
        let identifier = Identifier::custom(id_short.clone());
        Self::new(id_short, identifier)
    }

    pub fn with_element(mut self, element: impl Into<SubmodelElement>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn id_short(&self) -> &str {
        &self.id_short
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn elements(&self) -> &[SubmodelElement] {
        &self.elements
    }

    pub fn summary(&self) -> SubmodelSummary {
        SubmodelSummary {
            id_short: self.id_short.clone(),
            identification: self.identifier.clone(),
            element_count: self.elements.len(),
        }
    }

    pub fn element_summaries(&self) -> Vec<ElementSummary> {
        self.elements.iter().map(SubmodelElement::summary).collect()
    }

    pub fn element_summary(&self, path: &str) -> Outcome<ElementSummary> {
        Outcome::from_result(self.resolve(path).map(SubmodelElement::summary))
    }

    /// Nested map of every property value, read once each.
    pub fn values(&self) -> Outcome<Value> {
        Outcome::from_result(element::values_of(&self.elements))
    }

    pub fn read_value(&self, path: &str) -> Outcome<Value> {
        Outcome::from_result(self.property(path).and_then(|p| p.read()))
    }

    pub fn write_value(&self, path: &str, value: &Value) -> Outcome<()> {
        match self.property(path).and_then(|p| p.write(value)) {
            Ok(()) => {
                debug!(submodel = self.id_short.as_str(), path, "property written");
                Outcome::done()
            }
            Err(err) => Outcome::failure(err),
        }
    }

    pub async fn invoke(
        &self,
        path: &str,
        request: InvocationRequest,
        cancel: CancellationToken,
    ) -> Outcome<InvocationResponse> {
        match self.operation(path) {
            Ok(operation) => invoker::invoke(operation, request, cancel).await,
            Err(err) => Outcome::failure(err),
        }
    }

    pub fn start_invocation(
        &self,
        path: &str,
        request: InvocationRequest,
    ) -> Outcome<InvocationResponse> {
        match self.operation(path) {
            Ok(operation) => self.invocations.start(path, operation.clone(), request),
            Err(err) => Outcome::failure(err),
        }
    }

    pub fn invocation_status(&self, path: &str, request_id: &str) -> Outcome<InvocationStatus> {
        match self.operation(path) {
            Ok(_) => self.invocations.status(path, request_id),
            Err(err) => Outcome::failure(err),
        }
    }

    pub fn cancel_invocation(&self, path: &str, request_id: &str) -> Outcome<()> {
        match self.operation(path) {
            Ok(_) => self.invocations.cancel(path, request_id),
            Err(err) => Outcome::failure(err),
        }
    }

    /// Descriptor for publishing this submodel under `endpoint`.
    pub fn descriptor(&self, endpoint: Option<&str>) -> SubmodelDescriptor {
        let descriptor = SubmodelDescriptor::new(self.id_short.clone(), self.identifier.clone());
        match endpoint {
            Some(address) => descriptor.with_endpoint(Endpoint::http(address)),
            None => descriptor,
        }
    }

    fn resolve(&self, path: &str) -> Result<&SubmodelElement, ShellhubError> {
        element::resolve(&self.elements, path)
    }

    fn property(&self, path: &str) -> Result<&element::Property, ShellhubError> {
        match self.resolve(path)? {
            SubmodelElement::Property(property) => Ok(property),
            _ => Err(ShellhubError::not_found(format!(
                "`{path}` does not resolve to a property"
            ))),
        }
    }

    fn operation(&self, path: &str) -> Result<&Operation, ShellhubError> {
        match self.resolve(path)? {
            SubmodelElement::Operation(operation) => Ok(operation),
            _ => Err(ShellhubError::not_found(format!(
                "`{path}` does not resolve to an operation"
            ))),
        }
    }
}
