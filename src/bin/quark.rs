//! Quark CLI
//!
//! One-shot commands against a container file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quark::{Config, Engine, OptimizeMode};
use tracing_subscriber::{fmt, EnvFilter};

/// Quark
#[derive(Parser, Debug)]
#[command(name = "quark")]
#[command(about = "Single-file record store with prefetching and access-pattern reordering")]
#[command(version)]
struct Args {
    /// Container file (created if missing)
    container: PathBuf,

    /// Access log directory
    #[arg(short, long, default_value = "./logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List records in directory order
    Stat,

    /// Insert a file under its file name
    Insert {
        /// File to insert
        path: PathBuf,

        /// Directory position (defaults to the end)
        #[arg(short, long)]
        position: Option<u8>,
    },

    /// Write a record's bytes to stdout or a file
    Fetch {
        /// Record name
        name: String,

        /// Output file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Remove a record
    Remove {
        /// Record name
        name: String,
    },

    /// Rewrite records in the given order
    Reorder {
        /// Every stored name, in the new order
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Run an optimizer pass from the access log
    ///
    /// `next-potential-caching` is not persisted: it only validates the log
    /// and reports the graph for this invocation.
    Optimize {
        #[arg(value_enum)]
        mode: Mode,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    FrequentNeighbours,
    NextPotentialCaching,
}

impl From<Mode> for OptimizeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::FrequentNeighbours => OptimizeMode::FrequentNeighbours,
            Mode::NextPotentialCaching => OptimizeMode::NextPotentialCaching,
        }
    }
}

fn main() {
    // Initialize tracing/logging (stderr, stdout may carry payloads)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quark=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("Quark v{}", quark::VERSION);

    let config = Config::builder()
        .container_path(&args.container)
        .log_dir(&args.log_dir)
        // A one-shot process never waits for background prefetches
        .idle_task(false)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open {:?}: {}", args.container, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close container: {}", e);
        std::process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> quark::Result<()> {
    match command {
        Commands::Stat => print_stat(engine)?,
        Commands::Insert { path, position } => engine.insert(&path, position)?,
        Commands::Fetch { name, out } => {
            let written = match out {
                Some(path) => {
                    let mut sink = BufWriter::new(File::create(&path)?);
                    let n = engine.fetch(&name, &mut sink)?;
                    sink.flush()?;
                    n
                }
                None => {
                    let stdout = io::stdout();
                    let mut sink = stdout.lock();
                    let n = engine.fetch(&name, &mut sink)?;
                    sink.flush()?;
                    n
                }
            };
            tracing::info!("Fetched {} bytes", written);
        }
        Commands::Remove { name } => engine.remove(&name)?,
        Commands::Reorder { names } => engine.reorder(names.as_slice())?,
        Commands::Optimize { mode } => {
            engine.run_optimizer(mode.into())?;
            if let Mode::NextPotentialCaching = mode {
                tracing::warn!(
                    "Predictive mode lasts only for this process; \
                     one-shot commands never prefetch"
                );
            }
        }
    }
    Ok(())
}

fn print_stat(engine: &Engine) -> quark::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "ORD  {:<40}  SIZE", "NAME")?;
    for (i, record) in engine.records().iter().enumerate() {
        writeln!(out, "{:<3}  {:<40}  {}", i, record.name, human_size(record.size))?;
    }
    writeln!(out, "{} records, {} bytes", engine.record_count(), engine.file_len()?)?;
    Ok(())
}

fn human_size(size: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if size > MIB {
        format!("{:.1} MiB", size as f64 / MIB as f64)
    } else if size > KIB {
        format!("{:.1} KiB", size as f64 / KIB as f64)
    } else {
        format!("{} B", size)
    }
}
