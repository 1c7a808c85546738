//! CLI module for the user auth API
//!
//! `serve` is the only mode and runs when no subcommand is given.

pub mod serve;

use clap::{Parser, Subcommand};

/// User registration, login and token refresh API
#[derive(Parser)]
#[command(name = "user-auth-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve(serve::ServeArgs),
}

impl Cli {
    /// Resolve the command to run, falling back to `serve`
    pub fn into_command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Serve(serve::ServeArgs::default()))
    }
}
