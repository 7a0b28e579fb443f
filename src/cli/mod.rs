pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "zykor")]
#[command(about = "Zykor CLI - operator tools for the Zykor API")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        conflicts_with = "json",
        help = "Output in human-readable text format (default)"
    )]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a session token signed with ZYKOR_JWT_SECRET")]
    Token(commands::token::TokenArgs),

    #[command(about = "List the API routes and their permissions")]
    Routes(commands::routes::RoutesArgs),

    #[command(about = "Call an edge function with the service credential")]
    Invoke(commands::invoke::InvokeArgs),

    #[command(about = "Check the /health endpoint of a running server")]
    Ping(commands::ping::PingArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Routes(args) => commands::routes::handle(args, output_format).await,
        Commands::Invoke(args) => commands::invoke::handle(args, output_format).await,
        Commands::Ping(args) => commands::ping::handle(args, output_format).await,
    }
}
