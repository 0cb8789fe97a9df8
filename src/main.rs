//! API edge server binary.

use std::path::PathBuf;

use clap::Parser;

use api_edge::http::health::health_routes;
use api_edge::lifecycle;
use api_edge::routing::RouteTable;

#[derive(Parser)]
#[command(name = "api-edge")]
#[command(about = "HTTP entry layer: admission filters and error normalization", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    lifecycle::run(cli.config.as_deref(), |datastore| {
        RouteTable::new().mount("/", health_routes(datastore.clone()))
    })
    .await?;

    Ok(())
}
