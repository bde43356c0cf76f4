pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "changes")]
#[command(about = "Changes CLI - browse recorded changes and roll records back")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "CHANGES_API_URL", default_value = "http://localhost:3000", help = "Server base URL")]
    pub server: String,

    #[arg(long, global = true, env = "CHANGES_TOKEN", help = "Bearer token sent with every request")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List changes, newest first")]
    List(commands::changes::ListArgs),

    #[command(about = "Show a single change")]
    Show {
        #[arg(help = "Version id")]
        id: i64,
    },

    #[command(about = "Roll back a change")]
    Revert {
        #[arg(help = "Version id")]
        id: i64,
    },

    #[command(about = "Mint a development token signed with JWT_SECRET")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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

    let connect = || client::ChangesClient::new(&cli.server, cli.token.clone());

    match cli.command {
        Commands::List(args) => commands::changes::list(&connect()?, args, output_format).await,
        Commands::Show { id } => commands::changes::show(&connect()?, id, output_format).await,
        Commands::Revert { id } => commands::changes::revert(&connect()?, id, output_format).await,
        Commands::Token(args) => commands::token::handle(args, output_format),
    }
}
