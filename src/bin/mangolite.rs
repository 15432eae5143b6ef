use clap::{Args, Parser, Subcommand};
use mangolite::Database;
use mangolite::config::FindConfig;
use mangolite::utils::logger;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "mangolite", version, about = "Run Mango find queries over NDJSON documents", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a find config file (TOML). MANGOLITE_* env vars override it.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Write rolling logs into this directory. Logging is off when omitted.")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "Log level: off, error, warn, info, debug, trace")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Source {
    #[arg(long, help = "NDJSON file with one document per line")]
    docs: PathBuf,
    #[arg(long = "index", help = "Comma-separated index fields; repeat to declare several, in order")]
    indexes: Vec<String>,
    #[arg(long, default_value = "docs", help = "Collection name used in logs and metrics")]
    collection: String,
    #[arg(long, help = "The find body, e.g. '{\"selector\": {\"age\": {\"$gt\": 30}}}'")]
    query: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the query and print the result body")]
    Find {
        #[command(flatten)]
        source: Source,
        #[arg(long, help = "Also print the metrics counters after the result")]
        metrics: bool,
    },
    #[command(about = "Print the plan the query would run, without reading documents")]
    Explain {
        #[command(flatten)]
        source: Source,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_documents(db: &Database, source: &Source) -> CliResult<()> {
    let col = db.create_collection(&source.collection)?;
    let reader = BufReader::new(std::fs::File::open(&source.docs)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    let n = col.insert_json(lines.iter().map(String::as_str))?;
    log::info!(target: "mangolite::query", "loaded {n} documents from {}", source.docs.display());
    for spec in &source.indexes {
        let fields: Vec<&str> = spec.split(',').map(str::trim).filter(|f| !f.is_empty()).collect();
        col.create_index(&fields, None)?;
    }
    Ok(())
}

fn init_logging(dir: Option<&Path>, level: Option<&str>) -> CliResult<()> {
    if dir.is_none() {
        return Ok(());
    }
    logger::configure_logging(dir, level, None, false)
}

fn run(cli: Cli) -> CliResult<()> {
    init_logging(cli.log_dir.as_deref(), cli.log_level.as_deref())?;
    let config = FindConfig::load(cli.config.as_deref())?;
    let db = Database::with_config(config);
    match cli.command {
        Commands::Find { source, metrics } => {
            load_documents(&db, &source)?;
            let result = db.find(&source.collection, &source.query)?;
            println!("{}", serde_json::to_string_pretty(&result.to_json())?);
            if metrics {
                print!("{}", db.metrics_text());
            }
        }
        Commands::Explain { source } => {
            load_documents(&db, &source)?;
            let report = db.explain(&source.collection, &source.query)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
