//! Contract types for admin UI ↔ DAPPMANAGER communication
//!
//! These types define the wire protocol between the admin front-end and the
//! host management daemon, plus the per-call options and outcome shapes the
//! dispatcher hands to its collaborators.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword arguments of a single call
pub type Kwargs = Map<String, Value>;

/// Request line sent to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    /// Per-call correlation token
    pub id: String,
    pub method_name: String,
    #[serde(default)]
    pub kwargs: Kwargs,
}

/// Response line received from the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Error details in a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RpcResponse {
    /// Success response with data
    pub fn ok(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Error response
    pub fn err(id: impl Into<String>, message: &str) -> Self {
        Self {
            id: id.into(),
            success: false,
            data: None,
            error: Some(RpcError {
                message: message.to_string(),
                stack: None,
                code: None,
            }),
        }
    }

    /// Normalize into a [`CallResult`]
    ///
    /// An error marker wins over `success: true`. A failure without an error
    /// object still yields a readable message.
    pub fn into_result(self) -> CallResult {
        match (self.success, self.error) {
            (_, Some(error)) => CallResult::Failure {
                message: error.message,
                stack: error.stack,
                code: error.code,
            },
            (true, None) => CallResult::Success {
                data: self.data.unwrap_or(Value::Null),
            },
            (false, None) => CallResult::Failure {
                message: "Daemon reported a failure without details".to_string(),
                stack: None,
                code: None,
            },
        }
    }
}

/// Normalized outcome of one round trip
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Success {
        data: Value,
    },
    Failure {
        message: String,
        stack: Option<String>,
        code: Option<String>,
    },
}

/// Per-call options recognized by the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Notification text shown when the call succeeds
    pub toast_message: Option<String>,
    /// Do not notify when the call fails
    pub suppress_error_toast: bool,
}

impl CallOptions {
    /// Options with a success notification
    pub fn toast(message: impl Into<String>) -> Self {
        Self {
            toast_message: Some(message.into()),
            suppress_error_toast: false,
        }
    }

    pub fn suppress_error_toast(mut self) -> Self {
        self.suppress_error_toast = true;
        self
    }
}
