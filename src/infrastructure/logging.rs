use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// sqlx logs every statement at info
const DEFAULT_FILTER: &str = "info,sqlx=warn";

pub fn init_logging() {
    // RUST_LOG wins over the default filter when set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    if initialized.is_err() {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
}
