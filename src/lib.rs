pub mod clean;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod notify;
pub mod output;
pub mod pipelines;
pub mod poll;
pub mod settings;
pub mod table;
pub mod twitter;

pub use error::{Error, Result};

/// Install the fmt subscriber. Honours `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}
