//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_PORT: u16 = 20554;
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:20554";

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "mindful-breaks")]
#[command(about = "A work/break focus timer with a background daemon and a popup client")]
#[command(version)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the background timer daemon
    Serve(ServeConfig),
    /// Start a work session of the given number of minutes
    Start {
        /// Whole minutes, at least 1
        minutes: String,
        #[command(flatten)]
        client: ClientConfig,
    },
    /// Pause the running session, or resume the paused one
    Toggle {
        #[command(flatten)]
        client: ClientConfig,
    },
    /// Print the current countdown once
    Status {
        #[command(flatten)]
        client: ClientConfig,
    },
    /// Show the countdown, refreshing every second until it stops
    Watch {
        #[command(flatten)]
        client: ClientConfig,
    },
}

/// Daemon settings
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Port to bind the server to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Where timer state and pending alarms are persisted
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Do not show notifications or open the break page
    #[arg(long)]
    pub no_present: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeConfig {
    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// State file location, defaulting to the user's data directory
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_path)
    }
}

fn default_state_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("mindful-breaks").join("state.json"),
        None => PathBuf::from("mindful-breaks-state.json"),
    }
}

/// Popup client settings
#[derive(Args, Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the timer daemon
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ClientConfig {
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Log level for whichever command was chosen
    pub fn log_level(&self) -> &'static str {
        match &self.command {
            Command::Serve(serve) => serve.log_level(),
            Command::Start { client, .. }
            | Command::Toggle { client }
            | Command::Status { client }
            | Command::Watch { client } => client.log_level(),
        }
    }
}
