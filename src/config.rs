//! Runtime configuration
//!
//! Read from the environment (after loading `.env.local`, if present).
//! Every value has a default so an unconfigured client still starts.

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

macro_rules! env_config {
    ($name:ident, $env:literal, $default:expr) => {
        pub fn $name() -> String {
            std::env::var($env)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| $default.to_string())
        }
    };
}

// Daemon bridge command (e.g., "dappmanager-bridge")
env_config!(daemon_command, "DAPPMANAGER_RPC_BIN", "dappmanager-bridge");

// Extra bridge arguments, whitespace separated
env_config!(daemon_args, "DAPPMANAGER_RPC_ARGS", "");

// Per-request timeout in milliseconds
env_config!(request_timeout_ms, "DAPPMANAGER_RPC_TIMEOUT_MS", DEFAULT_TIMEOUT_MS);

// User action log file (e.g., "/usr/src/app/DNCORE/userActionLogs.log")
env_config!(user_action_log_path, "DAPPMANAGER_USER_ACTION_LOG", "userActionLogs.log");

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub daemon_command: String,
    pub daemon_args: Vec<String>,
    pub request_timeout: Duration,
    pub user_action_log_path: PathBuf,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            daemon_command: "dappmanager-bridge".to_string(),
            daemon_args: Vec::new(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_action_log_path: PathBuf::from("userActionLogs.log"),
        }
    }
}

impl RpcConfig {
    /// Load `.env.local` (or `../.env.local`) and read the environment
    pub fn from_env() -> anyhow::Result<Self> {
        if dotenvy::from_filename(".env.local").is_err() {
            let _ = dotenvy::from_filename("../.env.local");
        }
        Self::from_current_env()
    }

    /// Read the environment as it is, without touching `.env` files
    pub fn from_current_env() -> anyhow::Result<Self> {
        let timeout_raw = request_timeout_ms();
        let timeout_ms: u64 = timeout_raw
            .trim()
            .parse()
            .with_context(|| format!("DAPPMANAGER_RPC_TIMEOUT_MS is not a number: {:?}", timeout_raw))?;
        if timeout_ms == 0 {
            anyhow::bail!("DAPPMANAGER_RPC_TIMEOUT_MS must be greater than 0");
        }

        let config = Self {
            daemon_command: daemon_command(),
            daemon_args: daemon_args().split_whitespace().map(str::to_string).collect(),
            request_timeout: Duration::from_millis(timeout_ms),
            user_action_log_path: PathBuf::from(user_action_log_path()),
        };

        tracing::debug!(
            op = "rpc.config.loaded",
            daemon = %config.daemon_command,
            timeout_ms = timeout_ms,
            user_log = %config.user_action_log_path.display(),
            "RPC config loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "DAPPMANAGER_RPC_BIN",
        "DAPPMANAGER_RPC_ARGS",
        "DAPPMANAGER_RPC_TIMEOUT_MS",
        "DAPPMANAGER_USER_ACTION_LOG",
    ];

    fn clear() {
        for v in VARS {
            std::env::remove_var(v);
        }
    }

    #[test]
    fn test_defaults() {
        let _g = ENV_LOCK.lock().unwrap();
        clear();

        let config = RpcConfig::from_current_env().unwrap();
        let default = RpcConfig::default();
        assert_eq!(config.daemon_command, default.daemon_command);
        assert!(config.daemon_args.is_empty());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.user_action_log_path, default.user_action_log_path);
    }

    #[test]
    fn test_overrides() {
        let _g = ENV_LOCK.lock().unwrap();
        clear();
        std::env::set_var("DAPPMANAGER_RPC_BIN", "/usr/local/bin/wamp-bridge");
        std::env::set_var("DAPPMANAGER_RPC_ARGS", "--url  ws://my.wamp.dnp.dappnode.eth:8080/ws");
        std::env::set_var("DAPPMANAGER_RPC_TIMEOUT_MS", "2500");
        std::env::set_var("DAPPMANAGER_USER_ACTION_LOG", "/tmp/logs/user.log");

        let config = RpcConfig::from_current_env().unwrap();
        clear();

        assert_eq!(config.daemon_command, "/usr/local/bin/wamp-bridge");
        assert_eq!(
            config.daemon_args,
            vec!["--url", "ws://my.wamp.dnp.dappnode.eth:8080/ws"]
        );
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.user_action_log_path, PathBuf::from("/tmp/logs/user.log"));
    }

    #[test]
    fn test_invalid_timeout() {
        let _g = ENV_LOCK.lock().unwrap();
        clear();

        std::env::set_var("DAPPMANAGER_RPC_TIMEOUT_MS", "soon");
        let err = RpcConfig::from_current_env().unwrap_err();
        assert!(err.to_string().contains("DAPPMANAGER_RPC_TIMEOUT_MS"));

        std::env::set_var("DAPPMANAGER_RPC_TIMEOUT_MS", "0");
        assert!(RpcConfig::from_current_env().is_err());
        clear();
    }
}
