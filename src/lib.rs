//! NeoCare client core
//!
//! Runtime half of the workspace: configuration, the keyed store, the
//! upload session, the HTTP gateway, analysis flows, the assistant
//! chat and the delivery request composer. Pure logic lives in `neocare-common`.

pub mod analyzer;
pub mod chat;
pub mod cli;
pub mod composer;
pub mod config;
pub mod error;
pub mod gateway;
pub mod scanner;
pub mod session;
pub mod store;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` wins over `verbose`
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "neocare=debug,neocare_rust=debug" } else { "neocare=info,neocare_rust=info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
