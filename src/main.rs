//! droidpack entry point

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use droidpack::build::BuildError;
use droidpack::core::{APP_NAME, VERSION};
use droidpack::Cli;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    info!("{} v{}", APP_NAME, VERSION);

    if let Err(e) = cli.execute().await {
        error!("{:#}", e);
        let code = e.downcast_ref::<BuildError>().map(BuildError::exit_code).unwrap_or(1);
        std::process::exit(code);
    }
}
