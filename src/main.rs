use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use festival_loader::LoaderResult;
use festival_loader::config::LoaderConfig;
use festival_loader::envelope::Envelope;
use festival_loader::logging::{LogFormat, init_logging};
use festival_loader::notify::{CompositeNotifier, FileNotifier, Notifier, TracingNotifier};
use festival_loader::orchestrator::{IngestionOrchestrator, InvocationSummary};
use festival_loader::storage::LocalDirStorage;
use festival_loader::store::InMemoryRecordStore;
use festival_loader::types::{ObjectLocation, StoreItem};

#[derive(Parser)]
#[command(name = "festival-loader")]
#[command(about = "Load festival schedule files into the schedule store")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory holding `<bucket>/<key>` objects
    #[arg(long, global = true, env = "FESTIVAL_LOADER_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Record store snapshot file
    #[arg(long, global = true, env = "FESTIVAL_LOADER_STORE_PATH")]
    store_path: Option<PathBuf>,

    /// File that receives one JSON line per notification
    #[arg(long, global = true, env = "FESTIVAL_LOADER_NOTIFY_LOG")]
    notify_log: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogArg::Text)]
    log_format: LogArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogArg {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one invocation from a transport event file
    Ingest {
        /// JSON event: {"Records": [{"body": "..."}]}
        event: PathBuf,
    },
    /// Ingest objects already present under the storage root
    Load {
        #[arg(long)]
        bucket: String,
        /// Object keys, relative to the bucket
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Read records back from the store
    Query {
        #[command(subcommand)]
        by: Query,
    },
}

#[derive(Subcommand)]
enum Query {
    /// All performances of one performer
    Performer { name: String },
    /// Performances on a stage, optionally narrowed by a `Date#Start` prefix
    Stage {
        stage: String,
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Performances on a date, by start time
    Date { date: String },
    /// Performances with a popularity score, most popular first
    Popular {
        #[arg(long)]
        min: Option<i64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(match cli.log_format {
        LogArg::Text => LogFormat::Text,
        LogArg::Json => LogFormat::Json,
    });

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "festival-loader failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> LoaderResult<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(root) = cli.storage_root {
        config.storage_root = root;
    }
    if let Some(path) = cli.store_path {
        config.store_path = path;
    }
    if cli.notify_log.is_some() {
        config.notification_log = cli.notify_log;
    }

    let store = Arc::new(InMemoryRecordStore::load(&config.store_path)?);

    match cli.command {
        Commands::Ingest { event } => {
            let text = fs::read_to_string(&event)?;
            let result = orchestrator(&config, store.clone()).handle_event_json(&text);
            finish(&config, &store, result)
        }
        Commands::Load { bucket, keys } => {
            let locations: Vec<_> = keys
                .into_iter()
                .map(|key| ObjectLocation::new(bucket.clone(), key))
                .collect();
            let envelope = Envelope::for_locations(&locations);
            let result = orchestrator(&config, store.clone()).run(&envelope);
            finish(&config, &store, result)
        }
        Commands::Query { by } => {
            let records = match by {
                Query::Performer { name } => store.by_performer(&name)?,
                Query::Stage { stage, prefix } => store.by_stage(&stage, prefix.as_deref())?,
                Query::Date { date } => store.by_date(&date)?,
                Query::Popular { min } => store.popular(min)?,
            };
            let items: Vec<StoreItem> = records.iter().map(|r| r.to_item()).collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn orchestrator(config: &LoaderConfig, store: Arc<InMemoryRecordStore>) -> IngestionOrchestrator {
    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(TracingNotifier)];
    if let Some(path) = &config.notification_log {
        notifiers.push(Arc::new(FileNotifier::new(path)));
    }

    IngestionOrchestrator::new(Arc::new(LocalDirStorage::new(&config.storage_root)), store)
        .with_options(config.options.clone())
        .with_notifier(Arc::new(CompositeNotifier::new(notifiers)))
}

/// Persist whatever was written, then report the invocation result.
fn finish(
    config: &LoaderConfig,
    store: &InMemoryRecordStore,
    result: LoaderResult<InvocationSummary>,
) -> LoaderResult<ExitCode> {
    store.save(&config.store_path)?;
    info!(path = %config.store_path.display(), records = store.len(), "store saved");

    let summary = result?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}
