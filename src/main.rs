//! yaizu - command-line entry point for the Yaizu API catalog tools.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yaizu_catalog::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "yaizu_catalog=info"
    } else {
        "yaizu_catalog=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run().await
}
