//! CLI definition and dispatch.

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_graph_adapter::JsonGraphAdapter;
use crate::adapters::json_history_adapter::JsonHistoryAdapter;
use crate::adapters::snapshot_source_for;
use crate::domain::config_validation::{validate_config, validate_pipeline_config};
use crate::domain::correlation::DEFAULT_MIN_SAMPLES;
use crate::domain::error::MarketGraphError;
use crate::domain::graph::DEFAULT_MIN_CORRELATION;
use crate::domain::history::DEFAULT_WINDOW_MAX;
use crate::domain::pipeline::{self, PipelineConfig, RunOutcome, RunSummary};
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;

#[derive(Parser, Debug)]
#[command(
    name = "marketgraph",
    about = "Prediction-market price history and correlation graph builder"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by the commands that touch the history and graph files.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub history: Option<PathBuf>,
    #[arg(long)]
    pub graph: Option<PathBuf>,
    #[arg(long, env = "MIN_CORRELATION")]
    pub min_correlation: Option<f64>,
    #[arg(long)]
    pub window_max: Option<usize>,
    #[arg(long)]
    pub min_samples: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge a snapshot into the history and rebuild the graph
    Run {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
    /// Rebuild the graph from the persisted history only
    Rebuild {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Show retained samples per instrument
    Info {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Effective settings for one invocation: config file values with
/// command-line overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub history_path: PathBuf,
    pub graph_path: PathBuf,
    pub pipeline: PipelineConfig,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { store, snapshot } => run_update(&store, snapshot.as_ref()),
        Command::Rebuild { store } => run_rebuild(&store),
        Command::Info { store } => run_info(&store),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MarketGraphError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        error!("{err}");
        ExitCode::from(&err)
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        Some(p) => {
            info!("loading config from {}", p.display());
            load_config(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn build_pipeline_config(config: &dyn ConfigPort) -> PipelineConfig {
    let as_count = |v: i64| usize::try_from(v).unwrap_or(0);
    PipelineConfig {
        window_max: as_count(config.get_int("history", "window_max", DEFAULT_WINDOW_MAX as i64)),
        min_samples: as_count(config.get_int(
            "history",
            "min_samples",
            DEFAULT_MIN_SAMPLES as i64,
        )),
        min_correlation: config.get_double("graph", "min_correlation", DEFAULT_MIN_CORRELATION),
    }
}

pub fn resolve_settings(
    config: &dyn ConfigPort,
    args: &StoreArgs,
) -> Result<RunSettings, MarketGraphError> {
    validate_config(config)?;

    let mut pipeline = build_pipeline_config(config);
    if let Some(v) = args.window_max {
        pipeline.window_max = v;
    }
    if let Some(v) = args.min_samples {
        pipeline.min_samples = v;
    }
    if let Some(v) = args.min_correlation {
        pipeline.min_correlation = v;
    }
    validate_pipeline_config(&pipeline)?;

    let history_path = args
        .history
        .clone()
        .unwrap_or_else(|| JsonHistoryAdapter::from_config(config).path().to_path_buf());
    let graph_path = args
        .graph
        .clone()
        .unwrap_or_else(|| JsonGraphAdapter::from_config(config).path().to_path_buf());

    Ok(RunSettings {
        history_path,
        graph_path,
        pipeline,
    })
}

pub fn resolve_snapshot_path(
    override_path: Option<&PathBuf>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, MarketGraphError> {
    if let Some(p) = override_path {
        return Ok(p.clone());
    }
    config
        .get_string("snapshot", "path")
        .map(PathBuf::from)
        .ok_or_else(|| MarketGraphError::ConfigMissing {
            section: "snapshot".into(),
            key: "path".into(),
        })
}

fn settings_or_exit(store: &StoreArgs) -> Result<(FileConfigAdapter, RunSettings), ExitCode> {
    let adapter = load_optional_config(store.config.as_ref())?;
    match resolve_settings(&adapter, store) {
        Ok(settings) => Ok((adapter, settings)),
        Err(e) => {
            error!("{e}");
            Err((&e).into())
        }
    }
}

/// Exit status for a finished run: persistence failures surface as a
/// non-zero code even though the run itself completed.
pub fn summary_exit_code(summary: &RunSummary, history_expected: bool) -> ExitCode {
    if summary.graph_saved && (summary.history_saved || !history_expected) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(3)
    }
}

fn run_update(store: &StoreArgs, snapshot_override: Option<&PathBuf>) -> ExitCode {
    let (adapter, settings) = match settings_or_exit(store) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let snapshot_path = match resolve_snapshot_path(snapshot_override, &adapter) {
        Ok(p) => p,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };

    let now = Local::now().naive_local();
    let source = snapshot_source_for(snapshot_path, pipeline::iso_timestamp(now));
    let history_port = JsonHistoryAdapter::new(settings.history_path);
    let graph_sink = JsonGraphAdapter::new(settings.graph_path);

    match pipeline::run(
        &history_port,
        source.as_ref(),
        &graph_sink,
        &settings.pipeline,
        now,
    ) {
        RunOutcome::NoData => {
            println!("No data fetched.");
            ExitCode::SUCCESS
        }
        RunOutcome::Completed(summary) => {
            println!(
                "Update complete — Nodes: {}, Links: {}",
                summary.nodes, summary.links
            );
            summary_exit_code(&summary, true)
        }
    }
}

fn run_rebuild(store: &StoreArgs) -> ExitCode {
    let (_, settings) = match settings_or_exit(store) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let history_port = JsonHistoryAdapter::new(settings.history_path);
    let graph_sink = JsonGraphAdapter::new(settings.graph_path);
    let summary = pipeline::rebuild(
        &history_port,
        &graph_sink,
        &settings.pipeline,
        Local::now().naive_local(),
    );

    println!(
        "Rebuild complete — Nodes: {}, Links: {}",
        summary.nodes, summary.links
    );
    summary_exit_code(&summary, false)
}

fn run_info(store: &StoreArgs) -> ExitCode {
    let (_, settings) = match settings_or_exit(store) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let history = match JsonHistoryAdapter::new(settings.history_path).load() {
        Ok(h) => h,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };

    let min_samples = settings.pipeline.min_samples;
    let mut qualifying = 0usize;
    for (id, record) in history.iter() {
        let samples = record.sample_count();
        let marker = if samples >= min_samples {
            qualifying += 1;
            "ok"
        } else {
            "short"
        };
        println!("{id}\t{samples}\t{marker}\t{}", record.title);
    }

    if history.is_empty() {
        warn!("history is empty");
    }
    info!(
        instruments = history.len(),
        qualifying, min_samples, "history summary"
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    info!("validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        error!("{e}");
        return (&e).into();
    }

    let pipeline = build_pipeline_config(&adapter);
    println!("window_max      = {}", pipeline.window_max);
    println!("min_samples     = {}", pipeline.min_samples);
    println!("min_correlation = {}", pipeline.min_correlation);
    println!(
        "history         = {}",
        JsonHistoryAdapter::from_config(&adapter).path().display()
    );
    println!(
        "graph           = {}",
        JsonGraphAdapter::from_config(&adapter).path().display()
    );
    match adapter.get_string("snapshot", "path") {
        Some(p) => println!("snapshot        = {p}"),
        None => println!("snapshot        = (pass --snapshot)"),
    }
    println!("Configuration is valid.");
    ExitCode::SUCCESS
}
