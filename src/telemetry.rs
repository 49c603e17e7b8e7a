//! Tracing setup for binaries embedding the client

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`
///
/// `dappmanager_rpc` defaults to `info`. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::from_default_env().add_directive(
        "dappmanager_rpc=info"
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(op = "rpc.telemetry.init", "Tracing initialized");
    }
}
