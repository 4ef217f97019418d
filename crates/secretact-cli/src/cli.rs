//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use secretact_server::ServiceConfig;

#[derive(Parser)]
#[command(
    name = "secretact",
    about = "SecretAct - semantic secrets action service for Infisical",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub config: ServiceConfig,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service (default)
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["secretact", "--port", "9100"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config.port, 9100);
    }

    #[test]
    fn flags_populate_service_config() {
        let cli = Cli::try_parse_from([
            "secretact",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--infisical-url",
            "https://eu.infisical.com",
            "--http-timeout-secs",
            "5",
            "serve",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert!(cli.config.credentials().is_some());
        assert_eq!(cli.config.infisical_url(), Some("https://eu.infisical.com"));
        assert_eq!(cli.config.http_timeout().as_secs(), 5);
    }
}
