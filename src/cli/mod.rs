//! CLI module for tubeqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{content_preview, Output};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shown instead of an error when a video has no captions in the configured language.
pub const NO_CAPTIONS_MESSAGE: &str = "This video does not provide captions. Try another video.";

/// tubeqa - Ask questions about YouTube videos
///
/// Answers are generated only from the video's captions.
#[derive(Parser, Debug)]
#[command(name = "tubeqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TUBEQA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about a video
    Ask {
        /// YouTube watch URL (must contain ?v=...)
        url: String,

        /// The question to ask
        question: String,

        /// Do not print the source excerpts
        #[arg(long)]
        no_sources: bool,
    },

    /// Build a video's index without asking anything
    Index {
        /// YouTube watch URL
        url: String,
    },

    /// Show the caption chunks nearest to a query
    Search {
        /// YouTube watch URL
        url: String,

        /// Search query
        query: String,
    },

    /// List indexed videos
    List,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "tubeqa",
            "ask",
            "https://www.youtube.com/watch?v=abc123",
            "What is self-attention?",
            "--no-sources",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask {
                url,
                question,
                no_sources,
            } => {
                assert_eq!(url, "https://www.youtube.com/watch?v=abc123");
                assert_eq!(question, "What is self-attention?");
                assert!(no_sources);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["tubeqa", "-vv", "serve"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Serve { port: 3000, .. }));
    }
}
