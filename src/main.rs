//! Repograph CLI - parse a repository and ingest its structure into a graph

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use repograph::config::{self, RepographConfig};
use repograph::pipeline::Pipeline;
use repograph::store::GraphStore;
use repograph::ui::ProgressReporter;
use repograph::walker::Walker;
use repograph::{GrammarRegistry, Language};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "repograph")]
#[command(version)]
#[command(about = "Polyglot code structure graph - files, types and callables as a property graph")]
#[command(long_about = r#"
Repograph parses every supported source file in a repository with a
language-appropriate tree-sitter grammar and ingests the structure into a
property graph: Repository and File nodes linked by CONTAINS edges, type and
callable definition nodes linked by DEFINES edges.

Ingestion is idempotent: re-running against the same target never creates
duplicate nodes or edges.

Example usage:
  repograph ingest --path ./my-project
  repograph stats --database .repograph/graph.db
  repograph languages
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a repository and ingest its structure into the graph
    Ingest {
        /// Path to the repository root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Path to the database file (default: .repograph/graph.db under the target)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Repository name (defaults to the directory name)
        #[arg(short, long)]
        repo: Option<String>,

        /// Parse worker count (defaults to available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Extract only; print results as JSON without writing to the graph
        #[arg(long)]
        dry_run: bool,
    },

    /// Show node and edge counts for the graph
    Stats {
        /// Path to the database file
        #[arg(short, long, default_value = ".repograph/graph.db")]
        database: PathBuf,
    },

    /// Report per-language grammar load outcomes
    Languages,

    /// Write a repograph.toml config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Ingest {
            path,
            database,
            repo,
            workers,
            dry_run,
        } => run_ingest(path, database, repo, workers, dry_run),
        Commands::Stats { database } => {
            let store = GraphStore::open(&database)?;
            println!("{}", store.stats()?);
            Ok(())
        }
        Commands::Languages => {
            let registry = GrammarRegistry::load_all();
            for language in registry.loaded() {
                println!(
                    "{} {:<16} ({})",
                    "✓".green(),
                    language.to_string(),
                    language.extensions().join(", ")
                );
            }
            for (language, cause) in registry.failed() {
                println!("{} {:<16} {}", "✗".red(), language.to_string(), cause);
            }
            Ok(())
        }
        Commands::Init { force } => {
            let config_path = config::default_config_path();
            config::write_config(&config_path, &RepographConfig::default(), force)?;
            config::ensure_gitignore(std::path::Path::new("."))?;
            println!("Wrote {}", config_path.display());
            Ok(())
        }
    }
}

fn run_ingest(
    path: PathBuf,
    database: Option<PathBuf>,
    repo: Option<String>,
    workers: Option<usize>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let config = config::load_config(None)?.unwrap_or_default();

    let repo_name = repo
        .or_else(|| config.repository.clone())
        .or_else(|| {
            path.canonicalize()
                .ok()?
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    let db_path = database
        .or_else(|| config.database.clone().map(PathBuf::from))
        .unwrap_or_else(|| config::default_database_path_in(&path));

    let registry = GrammarRegistry::load_all();
    let failed = registry.failed().count();
    if failed > 0 {
        tracing::warn!(
            "{} of {} grammars failed to load; their files will be skipped",
            failed,
            Language::all().len()
        );
    }

    let walker = Walker::new(&path, &config.exclude, config.max_file_size());
    let candidates = walker.candidates()?;
    println!(
        "Found {} candidate files in {}",
        candidates.len().bold(),
        path.display()
    );

    let worker_count = workers.unwrap_or_else(|| config.workers());
    let pipeline = Pipeline::new(&registry, worker_count);
    let stop = AtomicBool::new(false);

    if dry_run {
        let (results, summary) = pipeline.extract(candidates, &stop);
        println!("{}", serde_json::to_string_pretty(&results)?);
        println!("{}", summary);
        return Ok(());
    }

    config::ensure_db_dir(&db_path)?;
    let store = GraphStore::open(&db_path)?;

    println!(
        "Ingesting repository {} into {}",
        repo_name.bold(),
        db_path.display()
    );

    let (reporter, progress_tx) = ProgressReporter::new(candidates.len());
    let summary = pipeline.run(candidates, &store, &repo_name, &stop, Some(&progress_tx))?;
    drop(progress_tx);
    reporter.finish();

    println!("{}", summary);
    println!();
    println!("{}", store.stats()?);

    if summary.files_failed > 0 {
        println!("{}", "Completed with failures (see log above).".yellow());
    } else {
        println!("{}", "Ingestion complete.".green());
    }
    Ok(())
}
