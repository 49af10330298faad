use anyhow::Result;
use clap::{Parser, Subcommand};

mod logs;
mod migrate;
mod serve;

#[derive(Parser)]
#[command(name = "resume-api", version, about = "Resume ingestion service")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Log lifecycle maintenance, typically run from cron
    #[command(subcommand)]
    Logs(logs::LogsCommand),
}

pub async fn run() -> Result<()> {
    let args = Cmd::parse();
    match args.command.unwrap_or(SubCommandType::Serve) {
        SubCommandType::Serve => serve::listen().await,
        SubCommandType::Migrate => migrate::apply().await,
        SubCommandType::Logs(command) => logs::run(command).await,
    }
}
