//! hello-mcp - Demo MCP server exposing a single greeting tool

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{completions, serve};

#[derive(Parser)]
#[command(name = "hello-mcp")]
#[command(author, version, about = "Demo MCP server exposing a greeting tool")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub serve: serve::ServeArgs,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // stdout carries protocol traffic in stdio mode
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    tracing::debug!("Starting hello-mcp");

    match &cli.command {
        Some(Commands::Completions(args)) => completions::run(args)?,
        None => serve::run(&cli.serve).await?,
    }

    Ok(())
}
