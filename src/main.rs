//! blobstored server binary.

use std::path::PathBuf;

use clap::Parser;

use blobstored::config::{self, ServerConfig};
use blobstored::{lifecycle, observability};

#[derive(Parser)]
#[command(name = "blobstored")]
#[command(about = "Content-addressable blob storage server", long_about = None)]
struct Flags {
    /// Optional TOML configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory to store blobs.
    #[arg(long)]
    root: Option<String>,

    /// Listen address.
    #[arg(long)]
    listen: Option<String>,

    /// Comma-separated list of queue partitions to reference uploaded
    /// blobs into. Typically one for your indexer and one per mirror
    /// full syncer.
    #[arg(long = "queue-partitions")]
    queue_partitions: Option<String>,

    /// Password file; first line is the access password. The
    /// BLOBSTORED_PASSWORD environment variable takes precedence.
    #[arg(long = "password-file")]
    password_file: Option<String>,

    /// Log incoming requests.
    #[arg(long)]
    reqlog: bool,

    /// Mount an in-memory indexer sink at /indexer.
    #[arg(long = "dev-indexer")]
    dev_indexer: bool,

    /// Database name for indexer-backed deployments.
    #[arg(long)]
    dbname: Option<String>,
}

fn exit_failure(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn build_config(flags: Flags) -> ServerConfig {
    let mut config = match &flags.config {
        Some(path) => match config::load_config(path) {
            Ok(c) => c,
            Err(err) => exit_failure(format!("Error loading {}: {err}", path.display())),
        },
        None => ServerConfig::default(),
    };

    if let Some(root) = flags.root {
        config.storage.root = root;
    }
    if let Some(listen) = flags.listen {
        config.listener.bind_address = listen;
    }
    if let Some(csv) = flags.queue_partitions {
        config.partitions.queue_partitions = csv;
    }
    if let Some(path) = flags.password_file {
        config.auth.password_file = Some(path);
    }
    if flags.reqlog {
        config.observability.request_log = true;
    }
    if flags.dev_indexer {
        config.indexer.enabled = true;
    }
    if let Some(db) = flags.dbname {
        config.indexer.database = db;
    }

    if let Err(errors) = config::validate_config(&config) {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        exit_failure(format!("Invalid configuration: {joined}"));
    }
    config
}

#[tokio::main]
async fn main() {
    let config = build_config(Flags::parse());

    observability::logging::init(&config.observability.log_level);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        storage_root = %config.storage.root,
        queue_partitions = %config.partitions.queue_partitions,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    if let Err(err) = lifecycle::startup::run(config).await {
        exit_failure(err);
    }
}
