use anyhow::Context;
use clap::Parser;
use grantlens::pipeline::{AnalysisOutcome, Pipeline};
use grantlens_analysis::{AnalysisConfig, HashingEmbedder};
use grantlens_core::GrantRecord;
use grantlens_storage::{load_raw_projects, ReportWriter, ReporterClient, SearchCriteria};
use grantlens_taxonomy::{display_name, TaxonomyConfig, TaxonomyModel};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Dual-method research grant categorization
#[derive(Parser, Debug)]
#[command(name = "grantlens")]
#[command(about = "Categorize research grants by keyword taxonomy and embedding similarity", long_about = None)]
struct Args {
    /// Taxonomy configuration (JSON)
    #[arg(short, long)]
    taxonomy: PathBuf,

    /// Raw RePORTER projects (JSON); skips fetching when given
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Fiscal years to fetch, comma separated (default: previous year)
    #[arg(long, value_delimiter = ',')]
    fiscal_years: Vec<i32>,

    /// Text search over project title and abstract
    #[arg(long)]
    search: Option<String>,

    /// Maximum number of search pages to request
    #[arg(long, default_value_t = grantlens_storage::DEFAULT_MAX_REQUESTS)]
    max_requests: usize,

    /// Base directory for the timestamped report directory
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Analysis settings (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// High-similarity threshold; overrides the config file
    #[arg(long)]
    threshold: Option<f32>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting GrantLens v{}", env!("CARGO_PKG_VERSION"));

    let taxonomy_config = TaxonomyConfig::from_path(&args.taxonomy)
        .with_context(|| format!("failed to load taxonomy {}", args.taxonomy.display()))?;
    let taxonomy = Arc::new(TaxonomyModel::new(taxonomy_config)?);
    info!(
        "Taxonomy loaded: {} columns from {:?}",
        taxonomy.columns().len(),
        args.taxonomy
    );

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_path(path)
            .with_context(|| format!("failed to load analysis config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.high_similarity_threshold = threshold;
        config.medium_similarity_threshold = config.medium_similarity_threshold.min(threshold);
        config.low_similarity_threshold = config.low_similarity_threshold.min(threshold);
    }
    config.validate()?;

    let records = load_records(&args).await?;
    if records.is_empty() {
        warn!("No grant records to analyze");
    }

    let model = Arc::new(HashingEmbedder::new(config.embedding_dim));
    let pipeline = Pipeline::new(taxonomy, model, config);
    let outcome = pipeline.run(records)?;

    let writer = ReportWriter::create(&args.output_dir)?;
    writer.write_report(&outcome.report())?;

    log_summary(&outcome);
    info!("Results saved to {:?}", writer.dir());
    Ok(())
}

async fn load_records(args: &Args) -> anyhow::Result<Vec<GrantRecord>> {
    if let Some(path) = &args.input {
        let projects = load_raw_projects(path)?;
        info!("Loaded {} projects from {:?}", projects.len(), path);
        return Ok(projects.iter().map(GrantRecord::from_raw).collect());
    }

    let mut criteria = SearchCriteria::default().with_fiscal_years(args.fiscal_years.clone());
    if let Some(text) = &args.search {
        criteria = criteria.with_search_text(text.clone());
    }
    info!("Fetching fiscal years {:?}", criteria.fiscal_years);

    let client = ReporterClient::new()?;
    let records = client.fetch_records(&criteria, args.max_requests).await;
    info!("Fetched {} projects", records.len());
    Ok(records)
}

fn log_summary(outcome: &AnalysisOutcome) {
    let overall = &outcome.overall;
    info!("Total grants analyzed: {}", overall.total_grants);
    info!("Total funding: ${:.2}", overall.total_funding);
    info!("Average award: ${:.2}", overall.average_award);

    for row in outcome.comparison.method_rows() {
        info!(
            "{}: {} detected, average score {:.2}, {} classifications",
            row.method, row.categories_detected, row.average_score, row.total_classifications
        );
    }

    for row in outcome.categories.rows.iter().filter(|r| r.column.starts_with("is_")) {
        info!("  {}: {} grants ({:.1}%)", display_name(&row.column), row.count, row.percentage);
    }

    for region in &outcome.regions.regions {
        info!(
            "  {}: {} grants, ${:.2} ({:.2}% of funding)",
            region.region, region.record_count, region.total_funding, region.funding_share
        );
    }
}
