//! parley command-line interface.
//!
//! `parley serve` runs the HTTP server; the other subcommands are thin clients
//! of a running server.

mod chat;
mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use parley_core::provider::SummaryLength;
use parley_core::{Config, Server};
use std::path::PathBuf;
use tracing::info;

use crate::client::ParleyClient;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Language detection, summarization and translation server")]
#[command(version)]
struct Cli {
    /// Base URL of a running server (client commands only)
    #[arg(long, global = true, default_value = "http://127.0.0.1:3000", env = "PARLEY_URL")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server until Ctrl-C
    Serve {
        /// YAML configuration file (defaults to ./config.yaml when present)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
    /// Detect the language of TEXT
    Detect { text: String },
    /// Summarize TEXT
    Summarize {
        text: String,

        #[arg(long, value_enum, default_value = "medium")]
        length: LengthArg,
    },
    /// Translate TEXT between two languages
    Translate {
        text: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,
    },
    /// Interactive chat session
    Chat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LengthArg {
    Short,
    Medium,
    Long,
}

impl From<LengthArg> for SummaryLength {
    fn from(arg: LengthArg) -> Self {
        match arg {
            LengthArg::Short => SummaryLength::Short,
            LengthArg::Medium => SummaryLength::Medium,
            LengthArg::Long => SummaryLength::Long,
        }
    }
}

fn load_config(path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_or_default(),
    };

    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    Ok(config)
}

fn serve(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        info!("Starting parley v{}", env!("CARGO_PKG_VERSION"));
        Server::new(config)?.start().await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley_core=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => serve(load_config(config, host, port)?),
        Command::Detect { text } => {
            let result = ParleyClient::new(&cli.server)?.detect(&text)?;
            println!(
                "{} {} {}",
                "Language:".bold(),
                result.language.green(),
                format!("(confidence {:.2})", result.confidence).dimmed()
            );
            Ok(())
        }
        Command::Summarize { text, length } => {
            let result = ParleyClient::new(&cli.server)?.summarize(&text, length.into())?;
            println!("{}\n{}", "Summary:".bold(), result.summary);
            Ok(())
        }
        Command::Translate { text, from, to } => {
            let result = ParleyClient::new(&cli.server)?.translate(&text, &from, &to)?;
            println!("{}", result.translated_text);
            Ok(())
        }
        Command::Chat => chat::run(&ParleyClient::new(&cli.server)?),
    }
}
