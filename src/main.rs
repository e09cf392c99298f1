//! access-siege - Access Log to Siege Url Files
//!
//! Entry point for the CLI application.

use access_siege::config::{AppConfig, CliArgs, ExportConfig, IngestConfig, Mode, StatsQuery};
use access_siege::db::RecordStore;
use access_siege::export::Partitioner;
use access_siege::ingest::Ingestor;
use access_siege::progress::{
    format_number, print_export_summary, print_header, print_ingest_summary, ProgressReporter,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = AppConfig::from_args(args).context("Invalid configuration")?;

    match &config.mode {
        Mode::Ingest(ingest) => run_ingest(&config, ingest),
        Mode::Export(export) => run_export(&config, export),
        Mode::Stats(query) => run_stats(&config, query),
    }
}

fn run_ingest(config: &AppConfig, ingest: &IngestConfig) -> Result<()> {
    let db_path = config.db_path.display().to_string();

    if config.show_progress {
        print_header(
            config.mode.name(),
            &db_path,
            &ingest.input.display().to_string(),
        );
    }

    let mut store = RecordStore::open(&config.db_path).context("Failed to open record store")?;

    let progress = config.show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Reading access log...");
    }

    let stats = Ingestor::new(&store, ingest.parser())
        .with_batch_size(ingest.batch_size)
        .with_progress(progress.as_ref())
        .ingest_file(&ingest.input)
        .context("Ingest failed")?;

    if let Some(ref p) = progress {
        p.finish("Ingest completed");
    }

    store.close().context("Failed to close record store")?;

    if config.show_progress {
        let db_size = std::fs::metadata(&config.db_path).ok().map(|m| m.len());
        print_ingest_summary(&stats, &db_path, db_size);
    }

    if stats.lines_skipped > 0 {
        info!(skipped = stats.lines_skipped, "Some lines could not be parsed");
    }

    Ok(())
}

fn run_export(config: &AppConfig, export: &ExportConfig) -> Result<()> {
    let store = open_existing(&config.db_path)?;

    if config.show_progress {
        print_header(
            config.mode.name(),
            &config.db_path.display().to_string(),
            &export.target.pattern,
        );
    }

    let progress = config.show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Writing url files...");
    }

    let start = Instant::now();
    let summary = Partitioner::new(&store)
        .with_filter(export.filter.as_ref())
        .with_page_size(export.page_size)
        .with_progress(progress.as_ref())
        .run(&export.target, export.policy)
        .context("Export failed")?;

    if let Some(ref p) = progress {
        p.finish_and_clear();
    }

    if config.show_progress {
        print_export_summary(&summary, start.elapsed());
    }

    info!(
        files = summary.files.len(),
        urls = summary.urls_written,
        "All files have been created"
    );

    Ok(())
}

fn run_stats(config: &AppConfig, query: &StatsQuery) -> Result<()> {
    let store = open_existing(&config.db_path)?;

    match query {
        StatsQuery::Urls { url } => {
            let count = store.count_urls(url.as_deref())?;
            match url {
                Some(url) => println!(
                    "The database has '{}' entries for url '{}'",
                    format_number(count),
                    url
                ),
                None => println!("The database has '{}' URLs", format_number(count)),
            }
        }
        StatsQuery::Ips { list } => {
            let ips = store.distinct_ips()?;
            println!("The database has '{}' IPs", format_number(ips.len() as u64));
            if *list {
                for ip in ips {
                    println!("{}", ip);
                }
            }
        }
    }

    Ok(())
}

/// Export and stats only read; never create or modify the store
fn open_existing(path: &Path) -> Result<RecordStore> {
    if !path.is_file() {
        bail!(
            "No record store at '{}', run the ingest command first",
            path.display()
        );
    }
    RecordStore::open_read_only(path).context("Failed to open record store")
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("access_siege=debug,warn")
    } else {
        EnvFilter::new("access_siege=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
