//! valtree CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "valtree")]
#[command(version)]
#[command(about = "Inspect YAML, JSON and directory value trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a JSON or YAML document and print its events
    Print {
        /// Document to print (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// Print the values stored at a dotted key
    Find {
        /// JSON or YAML document, or a directory
        path: PathBuf,

        /// Dotted key, e.g. server.port
        key: String,

        /// Preferred variant tag (repeatable, most specific first)
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// Print every path in a tree with its value type
    Tree {
        /// JSON or YAML document, or a directory
        path: PathBuf,
    },

    /// Look up an application configuration value
    Config {
        /// Application name, the first configuration group
        app: String,

        /// Dotted key, e.g. server.port
        key: String,

        /// Directory holding group documents (repeatable, searched in order)
        #[arg(short, long)]
        dir: Vec<PathBuf>,

        /// Directory tree holding secrets
        #[arg(long)]
        secrets: Option<PathBuf>,

        /// Variant tag (repeatable, most specific first)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Additional configuration group
        #[arg(short, long)]
        group: Option<String>,

        /// Print every value instead of the first one found
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "valtree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Print { file } => commands::print::execute(&file, &mut out),
        Commands::Find { path, key, tag } => commands::find::execute(&path, &key, &tag, &mut out),
        Commands::Tree { path } => commands::tree::execute(&path, &mut out),
        Commands::Config {
            app,
            key,
            dir,
            secrets,
            tag,
            group,
            all,
        } => commands::config::execute(
            commands::config::ConfigArgs {
                app,
                key,
                dirs: dir,
                secrets,
                tags: tag,
                group,
                all,
            },
            &mut out,
        ),
    }
}
