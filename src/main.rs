use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gce_machine_type::config::{Config, ProviderContext, VERSION};
use gce_machine_type::gcp::http::format_error;
use gce_machine_type::machine_type::{self, MachineTypeData, MachineTypeQuery};
use gce_machine_type::schema::{DATA_SOURCE_NAME, MACHINE_TYPE_SCHEMA};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Look up Compute Engine machine types
#[derive(Parser, Debug)]
#[command(name = "gce-machine-type", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long)]
    project: Option<String>,

    /// GCP zone to use (name or self-link)
    #[arg(short, long)]
    zone: Option<String>,

    /// Machine type to look up; repeat to read several concurrently
    #[arg(short, long = "machine-type")]
    machine_type: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Print the data source schema and exit
    #[arg(long)]
    schema: bool,

    /// Config file (defaults to <config dir>/gce-machine-type/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gce-machine-type {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gce-machine-type").join("gce-machine-type.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gce-machine-type").join("gce-machine-type.log");
    }
    PathBuf::from("gce-machine-type.log")
}

fn render<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    if args.schema {
        let schema = serde_json::json!({
            "data_source": DATA_SOURCE_NAME,
            "attributes": MACHINE_TYPE_SCHEMA,
        });
        println!("{}", render(&schema, args.output)?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    // Credentials are discovered lazily, on the first lookup that passes input checks
    let ctx = ProviderContext::from_config(&config)
        .context("Failed to initialize provider context")?;

    // No machine type still goes through the read so the caller gets the proper error
    let names: Vec<Option<String>> = if args.machine_type.is_empty() {
        vec![None]
    } else {
        args.machine_type.iter().cloned().map(Some).collect()
    };

    let queries: Vec<MachineTypeQuery> = names
        .into_iter()
        .map(|machine_type| MachineTypeQuery {
            project: args.project.clone(),
            zone: args.zone.clone(),
            machine_type,
        })
        .collect();

    let results = futures::future::join_all(
        queries.iter().map(|query| machine_type::read(&ctx, query)),
    )
    .await;

    let mut found: Vec<MachineTypeData> = Vec::new();
    let mut failures = 0;
    let mut input_failures = 0;
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(data) => found.push(data),
            Err(err) => {
                failures += 1;
                if err.is_input_error() {
                    input_failures += 1;
                }
                tracing::error!("Read of {:?} failed: {}", query.machine_type, err);
                eprintln!(
                    "Error: {}: {}",
                    query.machine_type.as_deref().unwrap_or("<none>"),
                    format_error(&err)
                );
            }
        }
    }

    if !found.is_empty() {
        let rendered = if found.len() == 1 {
            render(&found[0], args.output)?
        } else {
            render(&found, args.output)?
        };
        println!("{}", rendered);
    }

    if input_failures > 0 {
        anyhow::bail!(
            "{} of {} lookups had incomplete input (see --project, --zone, --machine-type)",
            input_failures,
            queries.len()
        );
    }
    if failures > 0 {
        anyhow::bail!("{} of {} lookups failed", failures, queries.len());
    }

    Ok(())
}
