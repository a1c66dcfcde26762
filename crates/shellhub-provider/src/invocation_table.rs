//! Background invocations addressed by request id.
//!
//! `start` spawns the invocation on the current tokio runtime and returns at
//! once; callers poll `status` and may `cancel`. Each entry owns its own
//! cancellation token, so cancelling one request never touches another.
//! Finished entries are dropped once the retention window has passed.

use crate::invoker;
use crate::operation::{ExecutionState, InvocationRequest, InvocationResponse, Operation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shellhub_kernel::{ErrorKind, Outcome, ShellhubError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct InvocationEntry {
    operation: String,
    token: CancellationToken,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    result: Option<Outcome<InvocationResponse>>,
}

/// Snapshot of one background invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationStatus {
    pub request_id: String,
    pub operation: String,
    pub execution_state: ExecutionState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome<InvocationResponse>>,
}

/// How long a finished invocation stays pollable.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct InvocationTable {
    entries: Arc<Mutex<BTreeMap<String, InvocationEntry>>>,
    retention: Duration,
}

impl Default for InvocationTable {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl InvocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Arc::default(),
            retention,
        }
    }

    /// Spawn `operation` and answer with an `Initiated` response.
    ///
    /// `operation_path` is the element path the entry is filed under.
    pub fn start(
        &self,
        operation_path: &str,
        operation: Operation,
        request: InvocationRequest,
    ) -> Outcome<InvocationResponse> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                return Outcome::failure(ShellhubError::io(format!(
                    "cannot start background invocation: {err}"
                )));
            }
        };

        let request_id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        self.lock().insert(
            request_id.clone(),
            InvocationEntry {
                operation: operation_path.to_string(),
                token: token.clone(),
                started_at: Utc::now(),
                finished_at: None,
                result: None,
            },
        );
        debug!(request_id = request_id.as_str(), operation = operation_path, "invocation started");

        let entries = Arc::clone(&self.entries);
        let id = request_id.clone();
        let retention = self.retention;
        runtime.spawn(async move {
            let mut outcome = invoker::invoke(&operation, request, token).await;
            if let Some(response) = outcome.payload.as_mut() {
                response.request_id = Some(id.clone());
            }
            {
                let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(entry) = entries.get_mut(&id) {
                    entry.finished_at = Some(Utc::now());
                    entry.result = Some(outcome);
                }
            }

            tokio::time::sleep(retention).await;
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            debug!(request_id = id.as_str(), "finished invocation evicted");
        });

        Outcome::ok(InvocationResponse {
            request_id: Some(request_id),
            execution_state: ExecutionState::Initiated,
            output_arguments: Default::default(),
            in_out_arguments: Default::default(),
        })
    }

    pub fn status(&self, operation_path: &str, request_id: &str) -> Outcome<InvocationStatus> {
        let entries = self.lock();
        let Some(entry) = entries
            .get(request_id)
            .filter(|entry| entry.operation == operation_path)
        else {
            return Outcome::failure(unknown(operation_path, request_id));
        };
        Outcome::ok(InvocationStatus {
            request_id: request_id.to_string(),
            operation: entry.operation.clone(),
            execution_state: state_of(entry.result.as_ref()),
            started_at: entry.started_at,
            finished_at: entry.finished_at,
            result: entry.result.clone(),
        })
    }

    /// Trigger the request's token. Finished requests are left untouched.
    pub fn cancel(&self, operation_path: &str, request_id: &str) -> Outcome<()> {
        let entries = self.lock();
        let Some(entry) = entries
            .get(request_id)
            .filter(|entry| entry.operation == operation_path)
        else {
            return Outcome::failure(unknown(operation_path, request_id));
        };
        if entry.result.is_some() {
            return Outcome::info(format!("invocation `{request_id}` already finished"));
        }
        entry.token.cancel();
        debug!(request_id, operation = operation_path, "invocation cancel requested");
        Outcome::done()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, InvocationEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unknown(operation_path: &str, request_id: &str) -> ShellhubError {
    ShellhubError::not_found(format!(
        "no invocation `{request_id}` for operation `{operation_path}`"
    ))
}

fn state_of(result: Option<&Outcome<InvocationResponse>>) -> ExecutionState {
    let Some(outcome) = result else {
        return ExecutionState::Running;
    };
    match outcome.error_kind() {
        None => ExecutionState::Completed,
        Some(ErrorKind::Cancelled) => ExecutionState::Cancelled,
        Some(ErrorKind::Timeout) => ExecutionState::Timeout,
        Some(_) => ExecutionState::Failed,
    }
}
