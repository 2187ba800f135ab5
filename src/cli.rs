use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "pickleball match integrity and rating core")]
pub struct Cli {
    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Create the rating tables if they do not exist
    Init {
        /// Drop existing rating data first
        #[arg(long)]
        reset: bool,
    },
    /// Validate a JSON array of set scores
    Validate {
        #[arg(short, long)]
        file: PathBuf,
        /// Games per set: 6 (standard) or 4 (short)
        #[arg(short, long, default_value_t = 6)]
        games_per_set: u8,
    },
    /// Validate a match score and print its authoritative winner
    Resolve {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Confirm and rate a batch of played matches
    Process {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Rank a tournament roster and list podium awards
    Standings {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show the best ratings of one discipline and pool
    Leaderboard {
        /// singles, doubles or mixed_doubles
        #[arg(short, long, default_value = "singles")]
        discipline: String,
        /// "global" or "club:<id>"
        #[arg(short, long, default_value = "global")]
        pool: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
