//! Operations: declared variables, handler seam, and the invocation wire types.

use crate::value::ValueType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellhub_kernel::ShellhubError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Message carried by a cancelled invocation outcome.
pub const CANCELLATION_MESSAGE: &str = "Cancellation was requested";

/// Arguments keyed by variable idShort.
pub type ArgumentSet = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationVariable {
    pub id_short: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub required: bool,
}

impl OperationVariable {
    pub fn required(id_short: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id_short: id_short.into(),
            value_type,
            required: true,
        }
    }

    pub fn optional(id_short: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id_short: id_short.into(),
            value_type,
            required: false,
        }
    }
}

/// Bound arguments handed to an operation body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationCall {
    pub(crate) inputs: ArgumentSet,
    pub(crate) in_out: ArgumentSet,
    pub(crate) outputs: ArgumentSet,
}

impl OperationCall {
    pub fn new(inputs: ArgumentSet, in_out: ArgumentSet) -> Self {
        Self {
            inputs,
            in_out,
            outputs: ArgumentSet::new(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    pub fn input_str(&self, name: &str) -> Option<&str> {
        self.input(name).and_then(Value::as_str)
    }

    pub fn input_i64(&self, name: &str) -> Option<i64> {
        self.input(name).and_then(Value::as_i64)
    }

    pub fn in_out(&self, name: &str) -> Option<&Value> {
        self.in_out.get(name)
    }

    pub fn set_in_out(&mut self, name: impl Into<String>, value: Value) {
        self.in_out.insert(name.into(), value);
    }

    pub fn set_output(&mut self, name: impl Into<String>, value: Value) {
        self.outputs.insert(name.into(), value);
    }

    pub fn outputs(&self) -> &ArgumentSet {
        &self.outputs
    }
}

/// The body of an operation.
///
/// Long-running bodies should watch `cancel`; the invoker also races the
/// body against it, so a body that never checks is still abandoned on
/// cancellation.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn invoke(
        &self,
        call: &mut OperationCall,
        cancel: CancellationToken,
    ) -> Result<(), ShellhubError>;
}

/// Adapter for synchronous bodies.
pub struct FnOperation<F>(F);

impl<F> FnOperation<F>
where
    F: Fn(&mut OperationCall) -> Result<(), ShellhubError> + Send + Sync,
{
    pub fn new(body: F) -> Self {
        Self(body)
    }
}

#[async_trait]
impl<F> OperationHandler for FnOperation<F>
where
    F: Fn(&mut OperationCall) -> Result<(), ShellhubError> + Send + Sync,
{
    async fn invoke(
        &self,
        call: &mut OperationCall,
        _cancel: CancellationToken,
    ) -> Result<(), ShellhubError> {
        (self.0)(call)
    }
}

#[derive(Clone)]
pub struct Operation {
    id_short: String,
    input_variables: Vec<OperationVariable>,
    in_out_variables: Vec<OperationVariable>,
    output_variables: Vec<OperationVariable>,
    handler: Arc<dyn OperationHandler>,
}

impl Operation {
    pub fn new(id_short: impl Into<String>, handler: impl OperationHandler + 'static) -> Self {
        Self {
            id_short: id_short.into(),
            input_variables: Vec::new(),
            in_out_variables: Vec::new(),
            output_variables: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_input(mut self, variable: OperationVariable) -> Self {
        self.input_variables.push(variable);
        self
    }

    pub fn with_in_out(mut self, variable: OperationVariable) -> Self {
        self.in_out_variables.push(variable);
        self
    }

    pub fn with_output(mut self, variable: OperationVariable) -> Self {
        self.output_variables.push(variable);
        self
    }

    pub fn id_short(&self) -> &str {
        &self.id_short
    }

    pub fn input_variables(&self) -> &[OperationVariable] {
        &self.input_variables
    }

    pub fn in_out_variables(&self) -> &[OperationVariable] {
        &self.in_out_variables
    }

    pub fn output_variables(&self) -> &[OperationVariable] {
        &self.output_variables
    }

    pub(crate) fn handler(&self) -> &dyn OperationHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id_short", &self.id_short)
            .field("input_variables", &self.input_variables)
            .field("in_out_variables", &self.in_out_variables)
            .field("output_variables", &self.output_variables)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    #[serde(default)]
    pub input_arguments: ArgumentSet,
    #[serde(default)]
    pub in_out_arguments: ArgumentSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl InvocationRequest {
    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.input_arguments.insert(name.into(), value);
        self
    }

    pub fn with_in_out(mut self, name: impl Into<String>, value: Value) -> Self {
        self.in_out_arguments.insert(name.into(), value);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionState {
    Initiated,
    Running,
    Completed,
    Cancelled,
    Failed,
    Timeout,
}

impl ExecutionState {
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Initiated | Self::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub execution_state: ExecutionState,
    #[serde(default)]
    pub output_arguments: ArgumentSet,
    #[serde(default)]
    pub in_out_arguments: ArgumentSet,
}
