//! SecretAct main entry point

use clap::Parser;
use secretact_cli::{
    cli::{Cli, Commands},
    commands::serve,
    error::CliResult,
    utils::{init_tracing, ColoredOutput},
};
use tracing::info;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", ColoredOutput::error("Error:"), e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    info!("SecretAct v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::execute(cli.config).await,
    }
}
