use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "chatfeed",
    about = "Scripted console demo of paged, live-updating feeds and drafts"
)]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Chat feed with an external page cursor and a shared draft cache
    Messages,
    /// Post feed with retryable initial load and a presenter-owned draft
    Posts,
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.unwrap_or(Command::Messages)
    }
}
