//! Completion notifications (toasts)
//!
//! The dispatcher never renders anything. It hands every outcome to a
//! [`CompletionHook`]; the UI decides how to show it.

use crate::error::CallError;
use crate::types::CallOptions;
use serde_json::Value;

/// A transient notification derived from a call outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Success(String),
    Error(String),
}

impl Toast {
    /// Toast to show for this outcome, if any
    ///
    /// Success notifies only when `toast_message` is set. Failure notifies
    /// unless `suppress_error_toast` is set.
    pub fn for_outcome(options: &CallOptions, outcome: &Result<Value, CallError>) -> Option<Toast> {
        match outcome {
            Ok(_) => options.toast_message.clone().map(Toast::Success),
            Err(_) if options.suppress_error_toast => None,
            Err(e) => Some(Toast::Error(match &options.toast_message {
                Some(msg) => format!("{} failed: {}", msg, e),
                None => e.to_string(),
            })),
        }
    }
}

/// Side channel invoked once per completed call
pub trait CompletionHook: Send + Sync {
    fn on_complete(&self, method: &str, options: &CallOptions, outcome: &Result<Value, CallError>);
}

/// Default hook: emits toasts as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingToasts;

impl CompletionHook for TracingToasts {
    fn on_complete(&self, method: &str, options: &CallOptions, outcome: &Result<Value, CallError>) {
        match Toast::for_outcome(options, outcome) {
            Some(Toast::Success(msg)) => {
                tracing::info!(op = "rpc.toast.success", method = %method, "{}", msg)
            }
            Some(Toast::Error(msg)) => {
                tracing::warn!(op = "rpc.toast.error", method = %method, "{}", msg)
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_toast_needs_message() {
        let ok = Ok(json!(null));
        assert_eq!(Toast::for_outcome(&CallOptions::default(), &ok), None);
        assert_eq!(
            Toast::for_outcome(&CallOptions::toast("Rebooting host..."), &ok),
            Some(Toast::Success("Rebooting host...".to_string()))
        );
    }

    #[test]
    fn test_error_toast() {
        let err = Err(CallError::Transport {
            message: "closed".to_string(),
        });
        assert_eq!(
            Toast::for_outcome(&CallOptions::default(), &err),
            Some(Toast::Error("Transport failure: closed".to_string()))
        );
        assert_eq!(
            Toast::for_outcome(&CallOptions::toast("Rebooting host..."), &err),
            Some(Toast::Error(
                "Rebooting host... failed: Transport failure: closed".to_string()
            ))
        );
        assert_eq!(
            Toast::for_outcome(&CallOptions::default().suppress_error_toast(), &err),
            None
        );
    }
}
