use clap::{Arg, Command};
use log::info;
use std::fs;

use artistimage::config::ServiceConfig;
use artistimage::data::BatchMode;
use artistimage::helpers::http_client::new_http_client;
use artistimage::helpers::imagestore::{ImageStore, MemoryImageStore, SqliteImageStore};
use artistimage::service::ArtistImageService;

fn main() {
    // Setup command line interface
    let matches = Command::new("artistimage_lookup")
        .about("Resolve representative images for artist names")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (JSON)")
                .required(false),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("FILE")
                .help("SQLite database file for the image cache (in-memory if omitted)")
                .required(false),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("Batch mode: new-only, all or retry-failed")
                .default_value("new-only"),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print cache statistics after the run")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("artists")
                .value_name("ARTIST")
                .help("Artist names to resolve")
                .num_args(1..)
                .required(true),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    artistimage::logging::init(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    // Load configuration if a file was given
    let mut settings = ServiceConfig::default();
    if let Some(config_path) = matches.get_one::<String>("config") {
        match fs::read_to_string(config_path) {
            Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(config) => {
                    settings = ServiceConfig::from_json(&config);
                    info!("Loaded configuration from {}", config_path);
                }
                Err(e) => {
                    eprintln!("Error: failed to parse configuration file {}: {}", config_path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error: failed to read configuration file {}: {}", config_path, e);
                std::process::exit(1);
            }
        }
    }

    // Command line database path overrides the configuration
    if let Some(db_file) = matches.get_one::<String>("database") {
        settings.database_file = Some(db_file.into());
    }

    let mode = {
        let mode_name = matches
            .get_one::<String>("mode")
            .map(|s| s.as_str())
            .unwrap_or("new-only");
        match BatchMode::from_name(mode_name) {
            Some(mode) => mode,
            None => {
                eprintln!("Error: unknown mode '{}' (expected new-only, all or retry-failed)", mode_name);
                std::process::exit(1);
            }
        }
    };

    let store: Box<dyn ImageStore> = match &settings.database_file {
        Some(db_file) => {
            println!("Using image cache database: {}", db_file.display());
            Box::new(SqliteImageStore::with_database_file(db_file))
        }
        None => {
            println!("No database file given, results will not be persisted");
            Box::new(MemoryImageStore::new())
        }
    };

    let http = new_http_client(settings.http_timeout_secs);
    let service = ArtistImageService::new(http, store, &settings);

    let artists: Vec<String> = matches
        .get_many::<String>("artists")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let report = service.run_batch(mode, &artists);

    for artist in &artists {
        if !service.has_attempted(artist) {
            println!("{}: not attempted", artist);
            continue;
        }
        // Attempted entries are served from cache with no further lookups
        match service.resolve(artist) {
            Some(payload) => println!("{}: image resolved ({} bytes encoded)", artist, payload.len()),
            None => println!("{}: no image found", artist),
        }
    }

    println!(
        "Batch complete: {} resolved, {} without image",
        report.success_count, report.fail_count
    );

    if matches.get_flag("stats") {
        let stats = service.stats();
        println!(
            "Cache: {} attempted, {} resolved, {} negative, {} pending",
            stats.total_attempted, stats.resolved, stats.negative, stats.pending
        );
    }
}
