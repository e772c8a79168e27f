//! Command-line interface definition for KabaddiGuru
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, authentication, history, analytics and
//! the contact form.

use clap::{Parser, Subcommand};

/// KabaddiGuru - Kabaddi analytics assistant
///
/// Ask questions about players, matches and teams, browse past
/// conversations and explore head-to-head analytics.
#[derive(Parser, Debug, Clone)]
#[command(name = "kabaddiguru")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long, env = "KABADDIGURU_API_URL")]
    pub api_url: Option<String>,

    /// Override the local store directory
    #[arg(long)]
    pub store_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for KabaddiGuru
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with the assistant
    Chat {
        /// Reopen a stored thread by id
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Sign in, sign up and manage the session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Browse stored conversations
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Query the analytics endpoints
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },

    /// Show suggested questions
    Suggestions {
        /// Focus the suggestions on one team
        #[arg(short, long)]
        team: Option<String>,
    },

    /// Send a message to the KabaddiGuru team
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "general")]
        category: String,
    },

    /// Run the local contact-form relay
    ServeContact {
        /// Address to listen on (defaults to `contact.bind`)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

/// Authentication subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Sign in to an existing account
    Signin {
        #[arg(short, long)]
        email: String,
        /// Read from the terminal when omitted
        #[arg(short, long, env = "KABADDIGURU_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// Read from the terminal when omitted
        #[arg(short, long, env = "KABADDIGURU_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user and chat quota
    Status,

    /// Request a password reset
    Forgot {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password with a reset token
    Reset {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        token: String,
        /// Read from the terminal when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored threads
    List,

    /// Show the messages of a thread
    Show {
        /// Thread id
        id: String,

        /// Show only the last N messages
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Analytics subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AnalyticsCommand {
    /// List all teams
    Teams,

    /// List matches between two teams
    Matches {
        team1: String,
        team2: String,
    },

    /// Search players by name
    Players {
        term: String,
    },

    /// Summarise one match
    MatchSummary {
        team1: String,
        team2: String,
        match_number: i64,
    },

    /// Summarise a player's performance
    PlayerSummary {
        player: String,
        /// Restrict to one match (`all` for every match)
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_url: None,
            store_path: None,
            command: Commands::Auth {
                command: AuthCommand::Status,
            },
        }
    }
}
