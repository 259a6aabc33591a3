//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for PhiGate using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// PhiGate - PHI compliance core
#[derive(Parser, Debug)]
#[command(name = "phigate")]
#[command(version, about, long_about = None)]
#[command(author = "PhiGate Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "phigate.toml", env = "PHIGATE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PHIGATE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show how a collection is classified and routed
    Classify(commands::classify::ClassifyArgs),

    /// Apply the database schemas to both stores
    Migrate(commands::migrate::MigrateArgs),

    /// Run retention enforcement once or on a schedule
    Enforce(commands::enforce::EnforceArgs),

    /// File a consent revocation or erasure request for a user
    Forget(commands::forget::ForgetArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_enforce() {
        let cli = Cli::parse_from(["phigate", "enforce"]);
        assert_eq!(cli.config, "phigate.toml");
        assert!(matches!(cli.command, Commands::Enforce(ref a) if !a.daemon));
    }

    #[test]
    fn test_cli_parse_enforce_daemon() {
        let cli = Cli::parse_from(["phigate", "enforce", "--daemon"]);
        assert!(matches!(cli.command, Commands::Enforce(ref a) if a.daemon));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["phigate", "--config", "custom.toml", "migrate"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Migrate(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["phigate", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["phigate", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_classify() {
        let cli = Cli::parse_from(["phigate", "classify", "symptom_logs"]);
        assert!(matches!(cli.command, Commands::Classify(ref a) if a.collection == "symptom_logs"));
    }

    #[test]
    fn test_cli_parse_forget() {
        let cli = Cli::parse_from(["phigate", "forget", "user-1"]);
        assert!(matches!(cli.command, Commands::Forget(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["phigate", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
