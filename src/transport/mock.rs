//! Scripted transport for tests

use super::Transport;
use crate::error::TransportError;
use crate::types::{RpcError, RpcRequest, RpcResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

pub(crate) enum MockReply {
    Data(Value),
    Remote { message: String, stack: Option<String> },
    Fail(TransportError),
}

type ReplyFn = Box<dyn Fn(&RpcRequest) -> MockReply + Send + Sync>;

pub(crate) struct MockTransport {
    sent: Mutex<Vec<RpcRequest>>,
    reply: ReplyFn,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn replying<F>(reply: F) -> Self
    where
        F: Fn(&RpcRequest) -> MockReply + Send + Sync + 'static,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            reply: Box::new(reply),
            delay: None,
        }
    }

    /// Always succeeds with `data`
    pub fn ok(data: Value) -> Self {
        Self::replying(move |_| MockReply::Data(data.clone()))
    }

    /// Always fails at the transport level
    pub fn failing(error: TransportError) -> Self {
        Self::replying(move |_| MockReply::Fail(error.clone()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<RpcRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match (self.reply)(&request) {
            MockReply::Data(data) => Ok(RpcResponse::ok(request.id, data)),
            MockReply::Remote { message, stack } => Ok(RpcResponse {
                id: request.id,
                success: false,
                data: None,
                error: Some(RpcError {
                    message,
                    stack,
                    code: None,
                }),
            }),
            MockReply::Fail(e) => Err(e),
        }
    }
}
