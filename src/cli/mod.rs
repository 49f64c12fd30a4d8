pub mod commands;
pub mod config;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

pub use context::{AdminContext, SessionCheck};

#[derive(Parser)]
#[command(name = "portfolio-admin")]
#[command(about = "Portfolio admin CLI - manage site content behind the admin session")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, sign out and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "List, create, update and delete content records")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },

    #[command(about = "Contact form submissions")]
    Messages {
        #[command(subcommand)]
        cmd: commands::messages::MessagesCommands,
    },

    #[command(about = "Headline site statistics")]
    Stats {
        #[command(subcommand)]
        cmd: commands::stats::StatsCommands,
    },

    #[command(about = "Testimonial letters in object storage")]
    Testimonials {
        #[command(subcommand)]
        cmd: commands::testimonials::TestimonialsCommands,
    },
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
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Data { cmd } => commands::data::handle(cmd, output_format).await,
        Commands::Messages { cmd } => commands::messages::handle(cmd, output_format).await,
        Commands::Stats { cmd } => commands::stats::handle(cmd, output_format).await,
        Commands::Testimonials { cmd } => commands::testimonials::handle(cmd, output_format).await,
    }
}
