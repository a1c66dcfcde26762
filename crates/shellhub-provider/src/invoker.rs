//! Synchronous-style invocation of a single operation.
//!
//! ```text
//! bind arguments ─► cancelled? ─► select!{ body, token.cancelled() } ─► cancelled? ─► outputs
//!                                        └─ optional timeout cancels the token
//! ```

use crate::operation::{
    ArgumentSet, CANCELLATION_MESSAGE, ExecutionState, InvocationRequest, InvocationResponse,
    Operation, OperationCall, OperationVariable,
};
use shellhub_kernel::{ErrorKind, Outcome, ShellhubError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run `operation` to completion, cancellation, or timeout.
pub async fn invoke(
    operation: &Operation,
    request: InvocationRequest,
    cancel: CancellationToken,
) -> Outcome<InvocationResponse> {
    let outcome = Outcome::from_result(try_invoke(operation, request, cancel).await);
    match outcome.error_kind() {
        None => debug!(operation = operation.id_short(), "invocation completed"),
        Some(ErrorKind::Cancelled) => {
            info!(operation = operation.id_short(), "invocation cancelled");
        }
        Some(kind) => warn!(
            operation = operation.id_short(),
            kind = kind.as_str(),
            message = outcome.message_text().unwrap_or_default(),
            "invocation failed"
        ),
    }
    outcome
}

fn cancelled() -> ShellhubError {
    ShellhubError::Cancelled(CANCELLATION_MESSAGE.to_string())
}

async fn try_invoke(
    operation: &Operation,
    request: InvocationRequest,
    cancel: CancellationToken,
) -> Result<InvocationResponse, ShellhubError> {
    let mut call = bind_arguments(operation, request.input_arguments, request.in_out_arguments)?;
    if cancel.is_cancelled() {
        return Err(cancelled());
    }

    // A timeout cancels only this invocation's child token.
    let token = cancel.child_token();
    let result = {
        let body = operation.handler().invoke(&mut call, token.clone());
        let run = async {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(cancelled()),
                result = body => result,
            }
        };
        match request.timeout_ms {
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), run).await {
                Ok(result) => result,
                Err(_) => {
                    token.cancel();
                    return Err(ShellhubError::Timeout(format!(
                        "operation `{}` exceeded {ms} ms",
                        operation.id_short()
                    )));
                }
            },
            None => run.await,
        }
    };
    result?;

    if cancel.is_cancelled() {
        return Err(cancelled());
    }

    Ok(InvocationResponse {
        request_id: None,
        execution_state: ExecutionState::Completed,
        output_arguments: collect_outputs(operation, call.outputs)?,
        in_out_arguments: call.in_out,
    })
}

/// Check supplied arguments against the declared variables.
pub(crate) fn bind_arguments(
    operation: &Operation,
    inputs: ArgumentSet,
    in_out: ArgumentSet,
) -> Result<OperationCall, ShellhubError> {
    let inputs = bind_set(operation.id_short(), "input", operation.input_variables(), inputs)?;
    let in_out = bind_set(operation.id_short(), "in-out", operation.in_out_variables(), in_out)?;
    Ok(OperationCall::new(inputs, in_out))
}

fn bind_set(
    operation: &str,
    role: &str,
    declared: &[OperationVariable],
    supplied: ArgumentSet,
) -> Result<ArgumentSet, ShellhubError> {
    let mut bound = ArgumentSet::new();
    for variable in declared {
        match supplied.get(&variable.id_short) {
            Some(value) => {
                let value = variable.value_type.coerce(value).map_err(|err| {
                    ShellhubError::validation(format!(
                        "{role} argument `{}` of `{operation}`: {}",
                        variable.id_short,
                        err.detail()
                    ))
                })?;
                bound.insert(variable.id_short.clone(), value);
            }
            None if variable.required => {
                return Err(ShellhubError::validation(format!(
                    "missing required {role} argument `{}` of `{operation}`",
                    variable.id_short
                )));
            }
            None => {}
        }
    }
    for name in supplied.keys() {
        if !declared.iter().any(|v| &v.id_short == name) {
            debug!(operation, role, argument = name.as_str(), "ignoring undeclared argument");
        }
    }
    Ok(bound)
}

fn collect_outputs(
    operation: &Operation,
    mut produced: ArgumentSet,
) -> Result<ArgumentSet, ShellhubError> {
    let mut outputs = ArgumentSet::new();
    for variable in operation.output_variables() {
        if let Some(value) = produced.remove(&variable.id_short) {
            let value = variable.value_type.coerce(&value).map_err(|err| {
                ShellhubError::validation(format!(
                    "output `{}` of `{}`: {}",
                    variable.id_short,
                    operation.id_short(),
                    err.detail()
                ))
            })?;
            outputs.insert(variable.id_short.clone(), value);
        }
    }
    for name in produced.keys() {
        debug!(
            operation = operation.id_short(),
            output = name.as_str(),
            "dropping undeclared output"
        );
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{FnOperation, OperationHandler};
    use crate::value::ValueType;
    use async_trait::async_trait;
    use serde_json::json;
    use shellhub_kernel::Severity;

    fn doubler() -> Operation {
        Operation::new(
            "Double",
            FnOperation::new(|call| {
                let x = call.input_i64("X").unwrap_or_default();
                call.set_output("Y", json!(x * 2));
                call.set_output("Extra", json!("ignored"));
                Ok(())
            }),
        )
        .with_input(OperationVariable::required("X", ValueType::Integer))
        .with_output(OperationVariable::required("Y", ValueType::Integer))
    }

    struct Sleeper;

    #[async_trait]
    impl OperationHandler for Sleeper {
        async fn invoke(
            &self,
            call: &mut OperationCall,
            _cancel: CancellationToken,
        ) -> Result<(), ShellhubError> {
            // Deliberately ignores the token.
            tokio::time::sleep(Duration::from_secs(5)).await;
            call.set_output("Done", json!(true));
            Ok(())
        }
    }

    fn sleeper() -> Operation {
        Operation::new("Sleep", Sleeper)
            .with_output(OperationVariable::optional("Done", ValueType::Boolean))
    }

    #[tokio::test]
    async fn completed_invocation_returns_declared_outputs() {
        let request = InvocationRequest::default().with_input("X", json!("21"));
        let outcome = invoke(&doubler(), request, CancellationToken::new()).await;
        let response = outcome.payload.expect("completed invocation has a payload");
        assert_eq!(response.execution_state, ExecutionState::Completed);
        assert_eq!(response.output_arguments.get("Y"), Some(&json!(42)));
        assert!(!response.output_arguments.contains_key("Extra"));
    }

    #[tokio::test]
    async fn missing_required_input_is_validation() {
        let outcome = invoke(&doubler(), InvocationRequest::default(), CancellationToken::new()).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Validation));
        assert!(outcome.message_text().is_some_and(|m| m.contains("`X`")));
    }

    #[tokio::test]
    async fn pre_cancelled_token_never_runs_the_body() {
        let token = CancellationToken::new();
        token.cancel();
        let request = InvocationRequest::default().with_input("X", json!(1));
        let outcome = invoke(&doubler(), request, token).await;
        assert!(!outcome.success);
        assert!(outcome.payload.is_none());
        let message = outcome.message.expect("cancelled outcome has a message");
        assert_eq!(message.severity, Severity::Information);
        assert_eq!(message.text, CANCELLATION_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_abandons_a_body_that_ignores_the_token() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = invoke(&sleeper(), InvocationRequest::default(), token).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_reported_and_leaves_caller_token_alone() {
        let token = CancellationToken::new();
        let request = InvocationRequest::default().with_timeout_ms(100);
        let outcome = invoke(&sleeper(), request, token.clone()).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
        assert_eq!(
            outcome.message.map(|m| m.severity),
            Some(Severity::Error)
        );
        assert!(!token.is_cancelled());
    }
}
