//! CLI entry point for Scout.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Scout search agent
#[derive(Parser, Debug)]
#[command(name = "scout", version, about = "Streaming search agent")]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the chat stream over HTTP
    Serve(ServeArgs),
    /// Run one chat turn and print its stream frames
    Chat(ChatArgs),
}

/// Arguments for `scout serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides SCOUT_BIND_ADDR)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "SCOUT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for `scout chat`.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// User message
    #[arg(short, long)]
    pub message: String,

    /// Resume this session instead of starting a new one
    #[arg(long)]
    pub checkpoint_id: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "SCOUT_CONFIG")]
    pub config: Option<PathBuf>,
}
