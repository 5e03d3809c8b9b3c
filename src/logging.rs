use tracing_subscriber::{EnvFilter, fmt};

/// Installs the stderr subscriber; stdout stays free for report blocks.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
