//! CLI argument definitions.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bassam")]
#[command(version, about = "Streaming terminal client for the Bassam assistant")]
pub struct Cli {
    /// Base URL of the Bassam deployment
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Display name sent with each question
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Skip the incremental channel and always use the single-shot endpoint
    #[arg(long, global = true)]
    pub no_stream: bool,

    /// Seconds to wait for the next stream fragment
    #[arg(long, global = true)]
    pub idle_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// The question text
        question: Vec<String>,
    },

    /// Query the search service
    Search {
        /// The search text
        query: Vec<String>,

        /// Ask the service to include price lookups
        #[arg(long)]
        prices: bool,
    },

    /// Look up public profiles by name
    People {
        /// The name to look up
        name: Vec<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigSubcommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommands {
    /// Initialize a new config file
    Init,
    /// Print config file location
    Where,
    /// Store the display name sent with each question
    SetUser {
        name: String,
    },
}
