use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global JSON subscriber.
///
/// `RUST_LOG` overrides `log_level` when set. Every event carries the service
/// name so logs from several containers can be told apart.
pub fn init_tracing(service_name: &str, log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init();

    match result {
        Ok(()) => tracing::info!(service = service_name, "Tracing initialized"),
        Err(e) => eprintln!(
            "Failed to install tracing subscriber for service '{}': {}",
            service_name, e
        ),
    }
}
