//! Dispatch wrapper
//!
//! Every call goes through [`Dispatcher::call`]:
//!
//! 1. Look up the method schema (unknown name → `UnknownMethod`, no I/O)
//! 2. Validate kwargs (missing key → `InvalidArgument`, no I/O)
//! 3. Send `{ id, methodName, kwargs }` and await the correlated response
//! 4. Normalize to data or `CallError`
//! 5. Record one user action log entry, then notify the completion hook
//!
//! Steps 3 to 5 run on their own task. Nothing is retried here. Callers
//! that do not need the result may drop the future or detach it with
//! [`Dispatcher::spawn_call`]; the call still completes and is logged.
//!
//! Calls refused on the client before they are issued go through
//! [`Dispatcher::reject`] so they are logged and notified the same way.

use crate::error::CallError;
use crate::notify::{CompletionHook, TracingToasts};
use crate::registry::{registry, CallSchema};
use crate::transport::Transport;
use crate::types::{CallOptions, CallResult, Kwargs, RpcRequest};
use crate::user_action_log::{UserActionLogEntry, UserActionLogSink};
use crate::validate::validate;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Kwargs that never reach the user action log in clear text
const REDACTED_KWARGS: &[&str] = &["newPassword", "seedPhraseEncrypted"];

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    log: Arc<dyn UserActionLogSink>,
    hook: Arc<dyn CompletionHook>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, log: Arc<dyn UserActionLogSink>) -> Self {
        Self {
            transport,
            log,
            hook: Arc::new(TracingToasts),
        }
    }

    /// Replace the completion hook
    pub fn with_hook(mut self, hook: Arc<dyn CompletionHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn user_action_log(&self) -> &Arc<dyn UserActionLogSink> {
        &self.log
    }

    /// Schema lookup and validation, without any I/O
    pub fn check(&self, method_name: &str, kwargs: &Kwargs) -> Result<&'static CallSchema, CallError> {
        let schema = registry()
            .get(method_name)
            .ok_or_else(|| CallError::UnknownMethod(method_name.to_string()))?;
        validate(schema, kwargs)?;
        Ok(schema)
    }

    /// Run one call and resolve with the daemon's data
    ///
    /// Dropping the returned future does not cancel the call.
    pub async fn call(
        &self,
        method_name: &str,
        kwargs: Kwargs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        join(self.spawn_call(method_name, kwargs, options)).await
    }

    /// Fire-and-forget: run the call on the runtime and return immediately
    ///
    /// The handle may be dropped. Logging and notification still happen.
    pub fn spawn_call(
        &self,
        method_name: &str,
        kwargs: Kwargs,
        options: CallOptions,
    ) -> JoinHandle<Result<Value, CallError>> {
        let this = self.clone();
        let method_name = method_name.to_string();
        tokio::spawn(async move {
            let outcome = this.execute(&method_name, &kwargs).await;
            this.complete(&method_name, kwargs, &options, &outcome).await;
            outcome
        })
    }

    /// Fail a call the client refused to issue, logging and notifying it
    ///
    /// Returns `error` so bindings can `return Err(dispatcher.reject(..).await)`.
    pub async fn reject(
        &self,
        method_name: &str,
        kwargs: Kwargs,
        error: CallError,
        options: CallOptions,
    ) -> CallError {
        tracing::debug!(
            op = "rpc.call.rejected",
            method = %method_name,
            code = %error.code(),
            "RPC call refused before sending"
        );

        let this = self.clone();
        let method_name = method_name.to_string();
        let outcome = Err(error.clone());
        let task = tokio::spawn(async move {
            this.complete(&method_name, kwargs, &options, &outcome).await;
            outcome
        });
        match join(task).await {
            Err(e) => e,
            Ok(_) => error,
        }
    }

    async fn complete(
        &self,
        method_name: &str,
        kwargs: Kwargs,
        options: &CallOptions,
        outcome: &Result<Value, CallError>,
    ) {
        self.record(method_name, kwargs, outcome).await;
        self.hook.on_complete(method_name, options, outcome);
    }

    async fn execute(&self, method_name: &str, kwargs: &Kwargs) -> Result<Value, CallError> {
        let schema = self.check(method_name, kwargs)?;

        let request = RpcRequest {
            id: uuid::Uuid::new_v4().to_string(),
            method_name: schema.method_name.to_string(),
            kwargs: kwargs.clone(),
        };
        let request_id = request.id.clone();

        tracing::debug!(
            op = "rpc.call.send",
            id = %request_id,
            method = %schema.method_name,
            "Sending RPC call"
        );

        let response = self.transport.send(request).await?;

        if response.id != request_id {
            return Err(CallError::Transport {
                message: format!(
                    "response id {} does not match request id {}",
                    response.id, request_id
                ),
            });
        }

        match response.into_result() {
            CallResult::Success { data } => Ok(data),
            CallResult::Failure {
                message,
                stack,
                code,
            } => Err(CallError::Remote {
                message,
                stack,
                code,
            }),
        }
    }

    /// Append exactly one entry. Never fails the call.
    async fn record(&self, method_name: &str, kwargs: Kwargs, outcome: &Result<Value, CallError>) {
        let kwargs = redact(kwargs);

        let entry = match outcome {
            Ok(data) => {
                tracing::info!(op = "rpc.call.ok", method = %method_name, "RPC call succeeded");
                UserActionLogEntry::info(
                    method_name,
                    &format!("Successfully called {}", method_name),
                    kwargs,
                    data.clone(),
                )
            }
            Err(e) => {
                tracing::warn!(
                    op = "rpc.call.failed",
                    method = %method_name,
                    code = %e.code(),
                    error = %e,
                    "RPC call failed"
                );
                UserActionLogEntry::error(method_name, &e.to_string(), kwargs, e.stack().map(str::to_string))
            }
        };

        // Sinks do blocking file I/O
        let log = self.log.clone();
        let written = match tokio::task::spawn_blocking(move || log.record(&entry)).await {
            Ok(written) => written,
            Err(e) => Err(anyhow::anyhow!("log task failed: {}", e)),
        };

        if let Err(e) = written {
            tracing::error!(
                op = "rpc.user_log.error",
                method = %method_name,
                error = %e,
                "Failed to record user action"
            );
        }
    }
}

async fn join(task: JoinHandle<Result<Value, CallError>>) -> Result<Value, CallError> {
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => Err(CallError::Transport {
            message: format!("call task failed: {}", e),
        }),
    }
}

fn redact(mut kwargs: Kwargs) -> Kwargs {
    for key in REDACTED_KWARGS {
        if let Some(value) = kwargs.get_mut(*key) {
            *value = Value::String("********".to_string());
        }
    }
    kwargs
}
