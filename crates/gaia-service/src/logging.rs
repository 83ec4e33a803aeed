use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "gaia=info,gaia_service=info,gaia_core=info,gaia_prometheus_bridge=info";

/// Installs the global subscriber on stderr so reports on stdout stay clean.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
