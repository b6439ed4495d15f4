//! Codemap CLI entry point

use clap::{Parser, Subcommand};
use codemap_core::Language;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "codemap")]
#[command(about = "Module dependency graph and knowledge staleness tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Project root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the project and write .codemap/graph.json
    Index {
        /// Only index files of this language
        #[arg(long)]
        lang: Option<Language>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare the knowledge cache against the files on disk
    Sync {
        /// Project to sync (overrides --root)
        project: Option<PathBuf>,

        /// Learn unknown and stale files
        #[arg(long)]
        learn: bool,

        /// List every path under its status
        #[arg(long)]
        verbose: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Only consider files of this language
        #[arg(long)]
        lang: Option<Language>,
    },
    /// Show what a module imports and what imports it
    Deps {
        /// Project-relative module path
        path: String,

        /// Include every module that depends on it indirectly
        #[arg(long)]
        transitive: bool,
    },
    /// Remove derived state
    Clear {
        /// Also remove the knowledge cache
        #[arg(long)]
        all: bool,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable.
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "codemap={0},codemap_core={0},codemap_indexer={0},codemap_sync={0}",
            log_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Codemap v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Index { lang, json } => commands::index(&cli.root, lang, json),
        Commands::Sync {
            project,
            learn,
            verbose,
            json,
            lang,
        } => {
            let root = project.unwrap_or(cli.root);
            commands::sync(&root, learn, lang, verbose, json)
        }
        Commands::Deps { path, transitive } => commands::deps(&cli.root, &path, transitive),
        Commands::Clear { all } => commands::clear(&cli.root, all),
        Commands::Version => {
            println!("Codemap v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
