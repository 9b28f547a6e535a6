use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use coda_extract::{
    config::Config,
    export::{self, ExportFormat},
    extract::SnapshotStore,
    metrics::{aggregate, compute_timesheet_metrics, filter, AggregateOp, Predicate},
    pipeline::{self, ExtractRequest, ExtractionOutcome, Extractor},
    settings::{Settings, SETTINGS_FILE},
};
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "coda-extract",
    version,
    about = "Extract a Coda table, clean it and export it with timesheet metrics"
)]
struct Cli {
    /// List the documents the token can see and exit.
    #[arg(long)]
    list_docs: bool,

    /// List the tables of a document and exit.
    #[arg(long, value_name = "DOC_ID")]
    list_tables: Option<String>,

    /// Document id (overrides CODA_DOC_ID).
    #[arg(long, value_name = "DOC_ID")]
    doc: Option<String>,

    /// Table id (overrides CODA_TABLE_ID).
    #[arg(long, value_name = "TABLE_ID")]
    table: Option<String>,

    /// API token (overrides CODA_API_TOKEN).
    #[arg(long)]
    token: Option<String>,

    /// Stop after this many rows.
    #[arg(long)]
    max_rows: Option<usize>,

    /// Only fetch these columns (display names, comma separated).
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Output file name; relative names land in the processed data dir.
    #[arg(long, short, value_name = "FILE")]
    output: Option<String>,

    #[arg(long, value_enum, default_value = "csv")]
    format: FormatArg,

    /// Also write `<output>_metrics.txt`.
    #[arg(long)]
    metrics: bool,

    /// Keep only rows matching `COLUMN OP VALUE`; OP is >, <, ==, contains or date_range.
    #[arg(long = "filter", value_name = "EXPR")]
    filters: Vec<String>,

    /// Group the (filtered) rows by this column before export.
    #[arg(long, value_name = "COLUMN", requires = "value")]
    group_by: Option<String>,

    /// Column reduced by --group-by.
    #[arg(long, value_name = "COLUMN")]
    value: Option<String>,

    /// sum, mean, count, max or min.
    #[arg(long, default_value = "sum")]
    op: String,

    /// Reprocess a raw snapshot instead of calling the API (`latest` for the newest).
    #[arg(long, value_name = "FILE|latest")]
    replay: Option<String>,

    /// Also log to logs/extraction_YYYYmmdd.log.
    #[arg(long)]
    log_file: bool,

    /// Dotenv file read before the environment.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Remember doc, table and row limit in the settings file.
    #[arg(long)]
    remember: bool,

    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Parquet,
    Excel,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Parquet => ExportFormat::Parquet,
            FormatArg::Excel => ExportFormat::Excel,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "extraction failed");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(log_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let file_layer = match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // ─── 1) config: env beats .env, flags beat env ──────────────────
    let mut cfg = Config::load(Some(cli.env_file.as_path())).context("loading configuration")?;
    if let Some(token) = &cli.token {
        cfg.api_token = Some(token.clone());
    }
    if let Some(doc) = &cli.doc {
        cfg.doc_id = Some(doc.clone());
    }
    if let Some(table) = &cli.table {
        cfg.table_id = Some(table.clone());
    }
    cfg.ensure_dirs().context("creating data directories")?;

    // ─── 2) logging ─────────────────────────────────────────────────
    let log_path = cli
        .log_file
        .then(|| cfg.daily_log_path(Local::now().date_naive()));
    init_logging(log_path.as_deref())?;
    info!("startup");

    // ─── 3) remembered selection fills the gaps ─────────────────────
    let settings = Settings::load(&cli.settings);
    if cfg.doc_id.is_none() && !settings.doc_id.is_empty() {
        cfg.doc_id = Some(settings.doc_id.clone());
    }
    if cfg.table_id.is_none() && !settings.table_id.is_empty() {
        cfg.table_id = Some(settings.table_id.clone());
    }
    let max_rows = cli.max_rows.or(settings.max_rows);

    // ─── 4) listings ────────────────────────────────────────────────
    if cli.list_docs {
        let extractor = Extractor::from_config(&cfg)?;
        println!("Available documents:");
        for doc in extractor.list_documents().await? {
            println!("  {}: {}", doc.id, doc.name);
        }
        return Ok(());
    }
    if let Some(doc_id) = &cli.list_tables {
        let extractor = Extractor::from_config(&cfg)?;
        println!("Tables in document {doc_id}:");
        for table in extractor.list_tables(doc_id).await? {
            println!("  {}: {}", table.id, table.name);
        }
        return Ok(());
    }

    // ─── 5) extract or replay ───────────────────────────────────────
    let outcome = match &cli.replay {
        Some(target) => replay(&cfg, target)?,
        None => {
            cfg.validate()?;
            let request = ExtractRequest::from_config(&cfg)?
                .with_max_rows(max_rows)
                .with_columns(cli.columns.clone());
            let extractor = Extractor::from_config(&cfg)?;
            println!("Extracting timesheet data from Coda...");
            extractor.run(&request).await?
        }
    };
    println!("\n{}", outcome.summary);

    // ─── 6) filter / aggregate ──────────────────────────────────────
    let predicates = cli
        .filters
        .iter()
        .map(|expr| expr.parse::<Predicate>())
        .collect::<Result<Vec<_>, _>>()?;
    let filtered = filter(&outcome.table, &predicates);
    let metrics = if predicates.is_empty() {
        outcome.metrics.clone()
    } else {
        compute_timesheet_metrics(&filtered)
    };
    let output_table = match (&cli.group_by, &cli.value) {
        (Some(group), Some(value)) => {
            aggregate(&filtered, group, value, AggregateOp::from_name(&cli.op))
        }
        _ => filtered,
    };

    // ─── 7) export ──────────────────────────────────────────────────
    let format = ExportFormat::from(cli.format);
    let path = export::output_path(&cfg.processed_dir, cli.output.as_deref(), format);
    let data_path = export::export(&output_table, format, &path)
        .with_context(|| format!("exporting to {}", path.display()))?;
    if cli.metrics {
        let report = export::write_report(&metrics, &export::metrics_path(&data_path))?;
        println!("Metrics report saved to: {}", report.display());
    }

    if cli.remember {
        let remembered = Settings {
            doc_id: cfg.doc_id.clone().unwrap_or_default(),
            table_id: cfg.table_id.clone().unwrap_or_default(),
            max_rows,
        };
        remembered.save(&cli.settings)?;
    }

    println!("\nExtraction complete!");
    println!("Processed data saved to: {}", data_path.display());
    info!(path = %data_path.display(), rows = output_table.row_count(), "all done");
    Ok(())
}

fn replay(cfg: &Config, target: &str) -> Result<ExtractionOutcome> {
    let path = if target == "latest" {
        SnapshotStore::new(&cfg.raw_dir)
            .latest()?
            .with_context(|| format!("no snapshots under {}", cfg.raw_dir.display()))?
    } else {
        PathBuf::from(target)
    };
    println!("Replaying snapshot {}...", path.display());
    let raw = SnapshotStore::load(&path)?;
    Ok(pipeline::process(raw))
}
