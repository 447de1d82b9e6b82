//! CLI argument definitions using clap
//!
//! Commands:
//! - quire init --config <path>
//! - quire check --config <path>
//! - quire serve --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quire - a schema-driven headless content API
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./quire.json")]
        config: PathBuf,
    },

    /// Validate a configuration file and print a summary
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./quire.json")]
        config: PathBuf,
    },

    /// Start the REST server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./quire.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args() {
        let cli = Cli::try_parse_from(["quire", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./quire.json"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_requires_known_flags() {
        assert!(Cli::try_parse_from(["quire", "check", "--config", "a.json"]).is_ok());
        assert!(Cli::try_parse_from(["quire", "check", "--data-dir", "x"]).is_err());
    }
}
