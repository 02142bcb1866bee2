//! Datastore administration CLI
//!
//! Usage:
//!   cargo run --example xmldb_admin -- --dir /usr/local/var/example status
//!   cargo run --example xmldb_admin -- --dir /usr/local/var/example copy candidate running
//!

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_xmldb::{CacheMode, Datastore, DatastoreConfig, StoreName};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "xmldb-admin")]
#[command(about = "Inspect and maintain configuration datastores")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Datastore directory
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// JSON configuration file (overridden by --dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable the tree cache
    #[arg(long, global = true)]
    nocache: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print metadata of every datastore
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether a datastore exists
    Exists { name: StoreName },
    /// Create a datastore
    Create { name: StoreName },
    /// Empty a datastore
    Delete { name: StoreName },
    /// Empty a datastore, creating it if missing
    Reset { name: StoreName },
    /// Copy one datastore into another
    Copy { from: StoreName, to: StoreName },
    /// Rename a datastore's backing file
    Rename {
        name: StoreName,
        /// New file path
        #[arg(long)]
        to: Option<PathBuf>,
        /// Suffix to append
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Print a datastore's content
    Show { name: StoreName },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DatastoreConfig::from_file(path)?,
        None => DatastoreConfig::new(),
    };
    if let Some(dir) = args.dir {
        config = config.dir(dir);
    }
    if args.nocache {
        config = config.cache(CacheMode::NoCache);
    }
    let mut ds = Datastore::connect(config);

    match args.command {
        Commands::Status { json } => {
            for name in StoreName::ALL {
                if ds.exists(name)? {
                    ds.load(name)?;
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&ds.status())?);
            } else {
                ds.dump(&mut std::io::stdout())?;
            }
        }
        Commands::Exists { name } => {
            println!("{name}: {:?}", ds.existence(name)?);
        }
        Commands::Create { name } => ds.create(name)?,
        Commands::Delete { name } => ds.delete(name)?,
        Commands::Reset { name } => ds.reset(name)?,
        Commands::Copy { from, to } => ds.copy(from, to)?,
        Commands::Rename { name, to, suffix } => {
            let path = ds.rename(name, to.as_deref(), suffix.as_deref())?;
            println!("{}", path.display());
        }
        Commands::Show { name } => {
            println!("{}", ds.read(name)?.to_json()?);
        }
    }

    ds.disconnect();
    Ok(())
}
