//! DAPPMANAGER RPC client
//!
//! Contract layer between the DAppNode admin UI and the DAPPMANAGER host
//! daemon:
//!
//! - [`registry`]: the closed catalogue of methods and their mandatory kwargs
//! - [`validate`]: kwargs checks that run before any I/O
//! - [`dispatch`]: one call = send, correlate, normalize, log, notify
//! - [`api`]: typed bindings, one per method
//! - [`user_action_log`]: append-only audit trail of every call
//! - [`status`]: cached daemon status fed by the bindings
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use dappmanager_rpc::{Api, CallOptions, RpcConfig};
//!
//! let api = Api::from_config(&RpcConfig::from_env()?);
//! let stats = api.get_stats(CallOptions::default()).await?;
//! println!("disk usage {}", stats.disk);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod data_uri;
pub mod dispatch;
pub mod error;
pub mod notify;
pub mod password;
pub mod registry;
pub mod status;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod user_action_log;
pub mod validate;

pub use api::Api;
pub use config::RpcConfig;
pub use dispatch::Dispatcher;
pub use error::{CallError, TransportError};
pub use notify::{CompletionHook, Toast, TracingToasts};
pub use registry::{registry, CallSchema, Method, Registry};
pub use status::{DappnodeStatus, StatusHandle, StatusPatch, StatusStore};
pub use transport::{StdioTransport, Transport};
pub use types::{CallOptions, CallResult, Kwargs, RpcRequest, RpcResponse};
pub use user_action_log::{FileUserActionLog, LogLevel, MemoryUserActionLog, UserActionLogEntry, UserActionLogSink};
