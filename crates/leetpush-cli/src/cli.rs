use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "leetpush")]
#[command(about = "Push accepted LeetCode solutions to a GitHub repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure the GitHub account and optional formatter
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Push a solution file
    Push {
        /// Problem slug, e.g. two-sum
        #[arg(long, value_name = "SLUG")]
        problem: String,
        /// Language name as shown by the judge, e.g. Python3
        #[arg(long, value_name = "LANG")]
        language: String,
        /// Solution source file
        file: PathBuf,
    },
    /// Check the token and repository access
    TestConnection,
    /// Show what the watcher sees in a page snapshot
    Inspect {
        /// Page snapshot JSON file
        snapshot: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Watch a page snapshot file and push accepted submissions
    Watch {
        /// Page snapshot JSON file, rewritten by the page shim
        snapshot: PathBuf,
        /// Polling interval in milliseconds
        #[arg(long, value_name = "N", default_value = "3000")]
        poll_ms: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the config file
    Init {
        /// GitHub username that owns the repository
        #[arg(long, value_name = "NAME")]
        username: String,
        /// Repository name (default: leetcode)
        #[arg(long, value_name = "NAME")]
        repository: Option<String>,
        /// Target branch (default: main)
        #[arg(long, value_name = "NAME")]
        branch: Option<String>,
        /// GitHub API base URL, for GitHub Enterprise
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Formatter model identifier
        #[arg(long, value_name = "MODEL")]
        formatter_model: Option<String>,
        /// Formatter API base URL
        #[arg(long, value_name = "URL")]
        formatter_base_url: Option<String>,
    },
    /// Store the GitHub personal access token in the keychain
    SetToken {
        /// Token starting with ghp_ or github_pat_
        token: String,
    },
    /// Store the formatter API key in the keychain
    SetFormatterKey {
        /// Key starting with sk-or-
        key: String,
    },
    /// Remove the formatter API key
    ClearFormatterKey,
    /// Show the current configuration
    Show,
}
