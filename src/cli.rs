use clap::{Parser, Subcommand};

/// Company portal — credential-gated pages with file-backed sessions
#[derive(Parser)]
#[command(name = "portald", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the portal server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "4000")]
        port: u16,
    },

    /// Manage persisted sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List persisted sessions (live and expired)
    List,
    /// Delete a session by token
    Revoke { token: String },
    /// Remove expired and corrupt session records now
    Sweep,
}
