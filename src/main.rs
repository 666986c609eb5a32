//! Interactive console for the patient registry.

mod console;

use registro_client::{config_from_env, HttpRegistryClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the registry console
///
/// Resolves the API base once, then hands stdin/stdout to the console loop.
///
/// # Environment Variables
/// - `REGISTRO_API_BASE`: explicit API base URL
/// - `REGISTRO_HOST`: runtime host name (default: "localhost")
/// - `REGISTRO_ORIGIN`: origin for non-local hosts (default: "https://{host}")
/// - `REGISTRO_TIMEOUT_SECS`: request timeout in seconds (default: 30)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid, or
/// - the terminal cannot be read or written.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("registro=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config_from_env(None)?;
    tracing::info!("-- Starting registro console against {}", config.api_base());

    let client = HttpRegistryClient::new(config.clone())?;
    console::run(client, &config).await
}
