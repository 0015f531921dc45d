use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for the process.
///
/// Default: info for our crates, overridable with `RUST_LOG`. Called once
/// from the binary; the pipeline only ever emits events.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{service_name}=info")));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .init();
}
