use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

mod dispatch;
mod engine;
mod error;
mod extract;
mod model;
mod registry;
mod rest;

use dispatch::Extractor;

#[derive(Parser)]
#[command(
    name = "quarry",
    about = "quarry — multi-strategy media URL extraction",
    version
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API
    Serve {
        /// Port to listen on (defaults to $PORT, then 8000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Extract one URL and print the result
    Probe {
        /// The media page URL
        url: String,
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "quarry=debug" } else { "quarry=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default.parse().expect("valid directive")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { port } => serve(port).await,
        Commands::Probe { url, json } => probe(&url, json).await,
    }
}

async fn serve(port: Option<u16>) -> Result<()> {
    let port = port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(8000);

    let extractor = Arc::new(Extractor::new());
    info!("starting quarry v{}", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        result = rest::start(port, Arc::clone(&extractor)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            extractor.shutdown().await;
            Ok(())
        }
    }
}

async fn probe(url: &str, json: bool) -> Result<()> {
    let extractor = Extractor::new();
    let outcome = extractor.handle(url).await;
    extractor.shutdown().await;

    match outcome {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("title: {}", result.title);
                if let Some(thumb) = &result.thumbnail {
                    println!("thumbnail: {thumb}");
                }
                for q in &result.qualities {
                    println!("{}: {}", q.label, q.url);
                }
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
