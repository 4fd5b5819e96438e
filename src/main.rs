mod cli;
mod client;
mod config;
mod flow;
mod labels;
mod logging;
mod metadata;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.uses_tui();
    logging::init(!is_non_tui);

    match cli::run(args).await {
        Ok(()) => {
            // A pending stdin read would otherwise keep the runtime alive on shutdown.
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            Err(e)
        }
    }
}
