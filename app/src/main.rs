#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    AskInput, AskStrategy, CommandStrategy, HashPasswordStrategy, InfoStrategy, InitStrategy,
    ServeInput, ServeStrategy, VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "policyqa")]
#[command(about = "Ask questions about policy documents", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/policyqa/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Address to listen on, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Ask questions about a local document
    Ask {
        /// PDF, DOCX or TXT file
        file: PathBuf,

        /// Single question to ask (interactive when omitted)
        #[arg(short, long)]
        question: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show configuration summary
    Info,
    /// Print the Argon2 hash to put in users[].password_hash
    HashPassword {
        password: String,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            ServeStrategy
                .execute(ServeInput {
                    config_path: cli.config,
                    bind,
                })
                .await
        }
        Commands::Ask {
            file,
            question,
            model,
        } => {
            AskStrategy
                .execute(AskInput {
                    config_path: cli.config,
                    file,
                    question,
                    model,
                })
                .await
        }
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(cli.config).await,
        Commands::HashPassword { password } => HashPasswordStrategy.execute(password).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
