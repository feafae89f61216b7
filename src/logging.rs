use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging. `RUST_LOG` wins over the default level when set.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("listings_geoprocessor={default_level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
