//! Request/response transports
//!
//! The dispatcher only needs "send one request, get its response". How the
//! bytes travel (stdio bridge, message bus, HTTP) is the transport's
//! business.

use crate::error::TransportError;
use crate::types::{RpcRequest, RpcResponse};
use async_trait::async_trait;

pub mod stdio;

#[cfg(test)]
pub(crate) mod mock;

pub use stdio::StdioTransport;

/// One logical request/response channel to the daemon
///
/// Implementations must support many concurrent `send`s and return the
/// response whose `id` matches the request's.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RpcRequest) -> Result<RpcResponse, TransportError>;
}
