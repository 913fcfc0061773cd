//! # Commit Index CLI (`cidx`)
//!
//! The `cidx` binary builds and inspects a SQLite index of a git
//! repository's commit history.
//!
//! ## Usage
//!
//! ```bash
//! cidx --config ./cidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cidx build` | Rebuild the index from the repository's full history |
//! | `cidx commits` | List indexed commits, newest first |
//! | `cidx show <hash>` | Show one commit: metadata, summary, changes, symbols |
//! | `cidx file-history <path>` | List commits that touched a path |
//! | `cidx symbol <name>` | List commits and files declaring a symbol |
//! | `cidx stats` | Print row counts and database size |
//!
//! ## Examples
//!
//! ```bash
//! # Rebuild the index for the current directory
//! cidx build --repo . --db ./commit-index.db
//!
//! # Which commits declared `ParseStatus`?
//! cidx symbol ParseStatus
//!
//! # What happened to src/store.rs over time?
//! cidx file-history src/store.rs
//! ```

mod builder;
mod changeset;
mod config;
mod db;
mod error;
mod inspect;
mod models;
mod progress;
mod repo;
mod store;
mod symbols;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::progress::ProgressMode;
use crate::repo::GitRepo;
use crate::store::IndexStore;

/// Commit Index CLI — build a queryable SQLite index of a git repository's
/// commit history.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with `[repo] path` and `[db] path` sections. `cidx build` can
/// override both from the command line.
#[derive(Parser)]
#[command(
    name = "cidx",
    about = "Commit Index — build a queryable SQLite index of a git repository's commit history",
    version,
    long_about = "Commit Index walks a repository's full ancestry oldest-first and records \
    per-commit metadata, per-file change records (including rename/copy tracking and \
    add/delete line counts), and a heuristic symbol index for touched source files. \
    Every build is a full rebuild; the inspection commands read the resulting database."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./cidx.toml`. When the file does not exist, built-in
    /// defaults are used (index the current directory into
    /// `./commit-index.db`).
    #[arg(long, global = true, default_value = "./cidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index from the repository's full history.
    ///
    /// Destroys any existing database at the configured path, walks the
    /// ancestry of HEAD oldest-first, and writes each commit's rows as one
    /// transaction. There is no incremental mode; every run is a full
    /// rebuild.
    Build {
        /// Repository to index (overrides `[repo] path`).
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Database file to write (overrides `[db] path`).
        #[arg(long)]
        db: Option<PathBuf>,

        /// Progress reporting on stderr: `auto`, `off`, `human`, or `json`.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// List indexed commits, newest first.
    Commits {
        /// Maximum number of commits to list.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Show one commit: metadata, summary, change records, and symbols.
    ///
    /// Accepts an unambiguous hash prefix.
    Show {
        /// Commit hash (or prefix).
        hash: String,
    },

    /// List commits that touched a path, oldest first.
    ///
    /// A renamed file is its own entity: history under the old path stays
    /// under the old path, and the change record's original-path column
    /// links the two.
    FileHistory {
        /// File path exactly as recorded in the index.
        path: String,
    },

    /// List commits and files declaring a symbol name.
    Symbol {
        /// Symbol name as extracted (exact match).
        name: String,
    },

    /// Print row counts and database size.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    match cli.command {
        Commands::Build { repo, db, progress } => {
            let repo_path = repo.unwrap_or_else(|| cfg.repo.path.clone());
            let db_path = db.unwrap_or_else(|| cfg.db.path.clone());

            if !repo_path.exists() {
                anyhow::bail!("repository path does not exist: {}", repo_path.display());
            }

            let mode = ProgressMode::from_flag(&progress).map_err(anyhow::Error::msg)?;
            let reporter = mode.reporter();

            let repo = GitRepo::open(&repo_path);
            let store = IndexStore::create(&db_path).await?;
            let report = builder::run_build(&repo, &store, reporter.as_ref()).await?;
            store.close().await;

            println!("build {}", repo_path.display());
            println!("  commits indexed: {}", report.commits);
            println!("  files: {}", report.files);
            println!("  change records: {}", report.changes);
            println!("  symbols: {}", report.symbols);
            println!("ok");
        }
        Commands::Commits { limit } => {
            inspect::run_commits(&cfg, limit).await?;
        }
        Commands::Show { hash } => {
            inspect::run_show(&cfg, &hash).await?;
        }
        Commands::FileHistory { path } => {
            inspect::run_file_history(&cfg, &path).await?;
        }
        Commands::Symbol { name } => {
            inspect::run_symbol(&cfg, &name).await?;
        }
        Commands::Stats => {
            inspect::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
