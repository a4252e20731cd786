//! PageKV CLI
//!
//! Runs one operation against a data directory, or dumps a table file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pagekv::storage::SortedTable;
use pagekv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// PageKV CLI
#[derive(Parser, Debug)]
#[command(name = "pagekv-cli")]
#[command(about = "CLI for the PageKV storage core")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./pagekv_data")]
    data_dir: PathBuf,

    /// Write buffer limit in KiB before a flush
    #[arg(short = 'l', long, default_value = "4096")]
    limit_kb: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Print the header, pages and index of a table file
    Inspect {
        /// Path to a .sst file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pagekv=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> pagekv::Result<()> {
    let Args {
        data_dir,
        limit_kb,
        command,
    } = args;

    let open = || {
        Engine::open(
            Config::builder()
                .data_dir(&data_dir)
                .write_buffer_limit(limit_kb.saturating_mul(1024))
                .build(),
        )
    };

    // Each invocation is its own process: close() persists whatever is buffered
    match command {
        Commands::Get { key } => {
            let engine = open()?;
            match engine.get(key.as_bytes())? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(nil)"),
            }
            engine.close()
        }
        Commands::Put { key, value } => {
            let engine = open()?;
            engine.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
            engine.close()
        }
        Commands::Delete { key } => {
            let engine = open()?;
            engine.delete(key.as_bytes())?;
            println!("OK");
            engine.close()
        }
        Commands::Inspect { file } => inspect(&file),
    }
}

fn inspect(file: &Path) -> pagekv::Result<()> {
    let table = SortedTable::open(file)?;

    println!("table:   {}", table.path().display());
    println!("size:    {} bytes of pages", table.header().size());
    println!("pages:   {}", table.page_count());
    println!("records: {}", table.entry_count());

    for (page_no, page) in table.pages().iter().enumerate() {
        let header = page.header();
        let first = page.first_key()?.map(String::from_utf8_lossy);
        let last = page.last_key()?.map(String::from_utf8_lossy);
        println!(
            "page {}: count={} offset={} free={} keys=[{}..{}]",
            page_no,
            header.count(),
            header.offset(),
            page.remaining(),
            first.unwrap_or_default(),
            last.unwrap_or_default()
        );
    }

    println!("index:");
    for (key, offset) in table.index() {
        let value = match table.get(key)? {
            Some(value) => String::from_utf8_lossy(&value).into_owned(),
            None => "<tombstone>".to_string(),
        };
        println!("  {} @ {} = {}", String::from_utf8_lossy(key), offset, value);
    }
    Ok(())
}
