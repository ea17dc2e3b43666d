//! Logging utilities

use tracing_subscriber::EnvFilter;

/// Initialize a JSON subscriber for embedding binaries.
///
/// `RUST_LOG` takes precedence; `info` is used when it is unset or invalid.
pub fn init_logger() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
}

/// Mask an identifier (SKU, destination, cost centre) for log output.
///
/// At most a quarter of the characters stay visible, capped at four, so
/// identifiers shorter than four characters are masked completely.
pub fn redact_identifier(value: &str) -> String {
    let visible = (value.chars().count() / 4).min(4);
    let prefix: String = value.chars().take(visible).collect();
    format!("{}****", prefix)
}
