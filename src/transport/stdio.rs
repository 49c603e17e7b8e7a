//! Daemon bridge over stdio
//!
//! Spawns the DAPPMANAGER bridge command as a child process and talks to it
//! with newline-delimited JSON.
//!
//! # Architecture
//!
//! - The bridge is spawned once on first request (lazy init)
//! - stdin carries requests, stdout carries responses
//! - Each request has a unique `id`; a reader task routes responses by id
//! - Timeout per request (10s by default)
//! - On process death (or once its stdout closes), respawns on the next
//!   request; calls still waiting on the dead process fail as closed
//! - A call dropped mid-flight unregisters its waiter

use super::Transport;
use crate::error::TransportError;
use crate::types::{RpcRequest, RpcResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Waiting calls keyed by request id
#[derive(Default)]
struct Pending {
    waiters: HashMap<String, oneshot::Sender<RpcResponse>>,
    /// Set by the reader task when stdout is gone; no waiter is accepted after
    closed: bool,
}

type PendingMap = Arc<Mutex<Pending>>;

/// Removes its waiter when the call finishes or its future is dropped
struct WaiterGuard {
    pending: PendingMap,
    id: String,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.waiters.remove(&self.id);
        }
    }
}

/// Running bridge process
struct BridgeProcess {
    child: Child,
    stdin: ChildStdin,
    pending: PendingMap,
    reader: JoinHandle<()>,
}

impl BridgeProcess {
    fn stdout_closed(&self) -> bool {
        self.pending.lock().map(|p| p.closed).unwrap_or(true)
    }
}

impl Drop for BridgeProcess {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Transport that owns a bridge child process
pub struct StdioTransport {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    inner: tokio::sync::Mutex<Option<BridgeProcess>>,
}

impl StdioTransport {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            inner: tokio::sync::Mutex::new(None),
        }
    }

    pub fn from_config(config: &crate::config::RpcConfig) -> Self {
        Self::new(
            config.daemon_command.clone(),
            config.daemon_args.clone(),
            config.request_timeout,
        )
    }

    fn spawn(&self) -> Result<BridgeProcess, TransportError> {
        tracing::info!(
            op = "rpc.bridge.spawn",
            program = %self.program,
            "Spawning daemon bridge"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // bridge logs go to stderr, which we inherit
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Spawn(format!("{}: {}", self.program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Spawn("failed to capture bridge stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Spawn("failed to capture bridge stdout".to_string()))?;

        let pending: PendingMap = Arc::new(Mutex::new(Pending::default()));
        let reader = tokio::spawn(read_responses(stdout, pending.clone()));

        tracing::info!(
            op = "rpc.bridge.spawned",
            pid = ?child.id(),
            "Daemon bridge spawned"
        );

        Ok(BridgeProcess {
            child,
            stdin,
            pending,
            reader,
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&self, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        let request_id = request.id.clone();

        let mut line = serde_json::to_string(&request)
            .map_err(|e| TransportError::Write(format!("serialize: {}", e)))?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();

        // Get or spawn process, register the waiter, then write. The lock
        // keeps request lines from interleaving.
        let waiter = {
            let mut guard = self.inner.lock().await;

            let needs_spawn = match guard.as_mut() {
                None => true,
                Some(proc) => match proc.child.try_wait() {
                    Ok(Some(status)) => {
                        tracing::warn!(
                            op = "rpc.bridge.died",
                            status = %status,
                            "Daemon bridge exited, will restart"
                        );
                        true
                    }
                    Ok(None) if proc.stdout_closed() => {
                        tracing::warn!(
                            op = "rpc.bridge.stdout_gone",
                            "Daemon bridge closed stdout, will restart"
                        );
                        true
                    }
                    Ok(None) => false,
                    Err(_) => true,
                },
            };

            if needs_spawn {
                *guard = Some(self.spawn()?);
            }

            let proc = match guard.as_mut() {
                Some(p) => p,
                None => return Err(TransportError::Closed),
            };

            {
                let mut pending = proc
                    .pending
                    .lock()
                    .map_err(|_| TransportError::Closed)?;
                // Reader may have hit EOF since the check above
                if pending.closed {
                    return Err(TransportError::Closed);
                }
                pending.waiters.insert(request_id.clone(), tx);
            }
            let waiter = WaiterGuard {
                pending: proc.pending.clone(),
                id: request_id.clone(),
            };

            let written = match proc.stdin.write_all(line.as_bytes()).await {
                Ok(()) => proc.stdin.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                tracing::error!(op = "rpc.bridge.stdin.error", error = %e, "Failed to write to bridge stdin");
                drop(waiter);
                *guard = None; // drop the process, respawn next time
                return Err(TransportError::Write(e.to_string()));
            }

            waiter
        };

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                drop(waiter);
                tracing::error!(
                    op = "rpc.bridge.timeout",
                    id = %request_id,
                    method = %request.method_name,
                    "Daemon did not respond in time"
                );
                Err(TransportError::Timeout(self.timeout.as_millis() as u64))
            }
        }
    }
}

/// Reader task: routes JSON lines from the bridge's stdout to waiting calls
async fn read_responses(stdout: ChildStdout, pending: PendingMap) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(op = "rpc.bridge.stdout.closed", error = %e, "Bridge stdout failed");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<RpcResponse>(trimmed) {
            Ok(resp) => {
                let waiter = pending
                    .lock()
                    .ok()
                    .and_then(|mut p| p.waiters.remove(&resp.id));
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(resp);
                    }
                    None => tracing::warn!(
                        op = "rpc.bridge.stdout.orphan",
                        id = %resp.id,
                        "Response for unknown or expired request"
                    ),
                }
            }
            Err(e) => {
                tracing::warn!(
                    op = "rpc.bridge.stdout.parse_error",
                    error = %e,
                    line = %trimmed,
                    "Failed to parse bridge response"
                );
            }
        }
    }

    tracing::warn!(op = "rpc.bridge.stdout.eof", "Daemon bridge stdout closed");

    // Dropping the senders wakes every waiter with "closed"
    if let Ok(mut p) = pending.lock() {
        p.closed = true;
        p.waiters.clear();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    /// Peer that answers every request line with `"pong"`
    const ECHO_PEER: &str = r#"while IFS= read -r line; do
id=$(printf '%s\n' "$line" | sed 's/^{"id":"\([^"]*\)".*$/\1/')
printf '{"id":"%s","success":true,"data":"pong"}\n' "$id"
done"#;

    fn request(id: &str) -> RpcRequest {
        RpcRequest {
            id: id.to_string(),
            method_name: "ping".to_string(),
            kwargs: Default::default(),
        }
    }

    fn shell(script: &str, timeout: Duration) -> StdioTransport {
        StdioTransport::new("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let transport = shell(ECHO_PEER, Duration::from_secs(5));

        let resp = transport.send(request("req-1")).await.unwrap();
        assert_eq!(resp.id, "req-1");
        assert!(resp.success);
        assert_eq!(resp.data, Some(json!("pong")));

        // Same process serves the next call
        let resp = transport.send(request("req-2")).await.unwrap();
        assert_eq!(resp.id, "req-2");
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_correlated() {
        let transport = Arc::new(shell(ECHO_PEER, Duration::from_secs(5)));

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let t = transport.clone();
                tokio::spawn(async move { t.send(request(&format!("req-{}", i))).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let resp = handle.await.unwrap().unwrap();
            assert_eq!(resp.id, format!("req-{}", i));
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let transport = shell("cat > /dev/null", Duration::from_millis(200));
        let err = transport.send(request("slow")).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(200));
    }

    #[tokio::test]
    async fn test_peer_exit_is_closed() {
        let transport = shell("read -r line; exit 0", Duration::from_secs(5));
        let err = transport.send(request("gone")).await.unwrap_err();
        assert_eq!(err, TransportError::Closed);
    }

    #[tokio::test]
    async fn test_dropped_call_unregisters_waiter() {
        let transport = shell("cat > /dev/null", Duration::from_secs(30));

        let abandoned = tokio::time::timeout(Duration::from_millis(100), transport.send(request("dropped"))).await;
        assert!(abandoned.is_err());

        let guard = transport.inner.lock().await;
        let proc = guard.as_ref().unwrap();
        assert!(proc.pending.lock().unwrap().waiters.is_empty());
    }

    #[tokio::test]
    async fn test_stdout_closed_fails_fast_and_respawns() {
        // Peer stays alive but stops writing
        let transport = shell("exec 1>&-; sleep 5", Duration::from_secs(10));

        let started = std::time::Instant::now();
        let err = transport.send(request("first")).await.unwrap_err();
        assert_eq!(err, TransportError::Closed);

        let err = transport.send(request("second")).await.unwrap_err();
        assert_eq!(err, TransportError::Closed);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let transport = StdioTransport::new(
            "/nonexistent/dappmanager-bridge",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = transport.send(request("x")).await.unwrap_err();
        assert!(matches!(err, TransportError::Spawn(_)));
    }
}
