use clap::Parser;

use bassam::cli::{self, Cli};
use bassam::core::Result;
use bassam::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init();

    let cli = Cli::parse();
    cli::run(cli).await
}
