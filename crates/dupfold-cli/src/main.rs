mod commands;
mod logging;
mod progress;

use std::path::Path;
use std::process;

use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use dupfold_core::analysis::SimilarityIndex;
use dupfold_core::{snapshot, MemoryStorage, Scanner};
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    // The log-file target comes from the config, so load it before
    // installing the subscriber.
    let config = match dupfold_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let _guard = logging::init_logger(&config);

    let args = Cli::parse();

    let root_path = match args.root_path() {
        Some(path) => path.to_string(),
        None => {
            error!("root path is required");
            process::exit(1);
        }
    };

    let storage = MemoryStorage::new();

    if let Some(data_path) = &args.data {
        info!("Loading existing data from {}", data_path);
        match snapshot::load_path(Path::new(data_path), &storage) {
            Ok(count) => info!("Loaded {} file records", count),
            Err(err) => {
                error!("Error loading snapshot: {}", err);
                process::exit(1);
            }
        }
    } else {
        let reporter = CliReporter::new();
        let scanner = Scanner::new(&root_path, &storage)
            .with_ignore_globs(&config.ignore_patterns)
            .with_reporter(&reporter);

        match scanner.scan() {
            Ok(count) => info!("Scanned {} files under {}", count, root_path),
            Err(err) => {
                error!("Scan failed: {}", err);
                process::exit(1);
            }
        }
    }

    let index = SimilarityIndex::calculate(&storage);
    print_report(&index, args.top);

    if let Some(export_path) = &args.export {
        match snapshot::save_path(&storage, Path::new(export_path)) {
            Ok(()) => info!("Snapshot written to {}", export_path),
            Err(err) => {
                error!("Error writing snapshot: {}", err);
                process::exit(1);
            }
        }
    }
}

fn print_report(index: &SimilarityIndex, top: usize) {
    let folders = index.similar_folders();
    if folders.is_empty() {
        println!("No duplicate folders found.");
        return;
    }

    info!("{} folders with cross-folder duplicates", folders.len());

    for folder in &folders {
        let groups = index.groups_for(folder);
        if groups.is_empty() {
            continue;
        }

        println!("{}", folder.bold());
        for (own, other) in groups.iter().take(top) {
            println!(
                "  {} {}  ({} - {}/{} files)",
                "~".dimmed(),
                other.path(),
                format!("{:.02}%", own.duplicated_percentage()).red(),
                own.duplicate_file_count,
                own.file_count,
            );
        }
        if groups.len() > top {
            println!("  {} {} more", "…".dimmed(), groups.len() - top);
        }
    }
}
