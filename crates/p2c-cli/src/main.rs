//! p2c - compilation gateway for the Pascal-S to C compiler.

mod batch;
mod browser;
mod colors;
mod interactive;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use p2c_core::{GatewayConfig, OutputMode, ProcessBridge};

const LONG_ABOUT: &str = r#"A simple compiler from Pascal-S to C.
 ####                                ##    ####    ###
 #   #   ####   ####   ###    ####    #        #  #   #
 ####   #   #  ###    #      #   #    #     ###   #
 #      #  ##    ###  #      #  ##    #    #      #   #
 #       ## #  ####    ###    ## #   ###   #####   ###
"#;

#[derive(Parser)]
#[command(name = "p2c")]
#[command(about = "A simple compiler from Pascal-S to C")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Result to show: 0 token sequence, 1 syntax tree, 2 C code.
    /// Ignored in browser mode, where each request picks its own.
    #[arg(short, long, global = true, default_value = "2")]
    show: OutputMode,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in browser mode (HTTP gateway)
    Browser,

    /// Run in cli mode, reading source code from stdin
    Cli {
        /// Line that ends the source code
        #[arg(short, long, default_value = "EOF")]
        terminator: String,
    },

    /// Run in file mode
    File {
        /// Path to input file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env first so RUST_LOG from it reaches the filter
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::info!("No .env file found."),
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = GatewayConfig::from_env().context("Invalid configuration")?;
    let bridge = ProcessBridge::new(&config);

    match cli.command {
        Commands::Browser => {
            tracing::info!("You are in browser mode.");
            browser::execute(&config, bridge).await?;
        }

        Commands::Cli { terminator } => {
            tracing::info!("You are in cli mode. Please input source code.");
            interactive::execute(&bridge, cli.show, &terminator).await;
        }

        Commands::File { input, output } => {
            batch::execute(&bridge, cli.show, &input, &output).await?;
        }
    }

    Ok(())
}
