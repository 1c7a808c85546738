use clap::Parser;
use user_auth_api::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().into_command() {
        Command::Serve(args) => cli::serve::run(args).await,
    }
}
