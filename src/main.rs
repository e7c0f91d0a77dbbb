use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod config;
mod engine;
mod error;
mod mpris;
mod player;
mod queue;
mod runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = runtime::load_settings();

    // RUST_LOG wins over the configured filter. Logs go to stderr so they do
    // not interleave with command output.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(problem) = config_problem {
        warn!("{problem}");
    }

    runtime::run(settings)
}
