use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{FileSource, TableSource};
use pipeline::{CANDIDATE_LIMIT, ForestTrainer, Prediction, TOP_K_PER_REGION};
use recommender::{
    CATALOG_PATH, CSV_MIRROR_DIR, DatabaseConfig, MemorySink, OUTPUT_SCHEMA, OUTPUT_TABLE,
    ParquetSnapshotSink, PostgresSink, PostgresSource, RecommendationPipeline, RunSettings,
    SNAPSHOT_PATH, WAREHOUSE_SCHEMA,
};
use sources::CandidateMovie;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// Regional movie recommendations - batch scoring feed
#[derive(Parser)]
#[command(name = "regional-recs")]
#[command(about = "Trains a rating model and publishes top movies per region", long_about = None)]
struct Cli {
    /// Directory with the CSV mirror of the warehouse tables
    #[arg(short, long, default_value = CSV_MIRROR_DIR)]
    data_dir: PathBuf,

    /// Read the training tables from the Postgres warehouse instead
    #[arg(long)]
    from_database: bool,

    /// Warehouse schema of the training tables
    #[arg(long, default_value = WAREHOUSE_SCHEMA)]
    schema: String,

    /// External catalog snapshot (.parquet or .csv)
    #[arg(short, long, default_value = CATALOG_PATH)]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and replace the published predictions
    Run {
        /// Recommendations kept per region
        #[arg(long, default_value_t = TOP_K_PER_REGION)]
        top_k: usize,

        /// Catalog titles scored per run
        #[arg(long, default_value_t = CANDIDATE_LIMIT)]
        candidate_limit: usize,

        /// Output schema in Postgres
        #[arg(long, default_value = OUTPUT_SCHEMA)]
        output_schema: String,

        /// Output table in Postgres
        #[arg(long, default_value = OUTPUT_TABLE)]
        output_table: String,

        /// Parquet mirror of the output table
        #[arg(long, default_value = SNAPSHOT_PATH)]
        snapshot: PathBuf,

        /// Skip persistence and print the head of each region
        #[arg(long)]
        dry_run: bool,

        /// Rows shown per region in dry-run output
        #[arg(long, default_value = "5")]
        show: usize,
    },

    /// Show the prepared candidate set
    Candidates {
        /// Catalog titles to keep
        #[arg(long, default_value_t = CANDIDATE_LIMIT)]
        limit: usize,

        /// Rows to print
        #[arg(long, default_value = "20")]
        show: usize,
    },

    /// Show training-row and region counts
    Training,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(cli).await {
        error!("{err:#}");
        eprintln!("{} {err:#}", "✗".red());
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let start = Instant::now();

    match cli.command {
        Commands::Run {
            top_k,
            candidate_limit,
            ref output_schema,
            ref output_table,
            ref snapshot,
            dry_run,
            show,
        } => {
            let settings = RunSettings {
                warehouse_schema: cli.schema.clone(),
                top_k,
                candidate_limit,
                ..RunSettings::default()
            };
            if dry_run {
                handle_dry_run(&cli, settings, show).await?
            } else {
                handle_run(&cli, settings, output_schema, output_table, snapshot).await?
            }
        }
        Commands::Candidates { limit, show } => {
            let settings = RunSettings {
                candidate_limit: limit,
                ..RunSettings::default()
            };
            handle_candidates(&cli, settings, show).await?
        }
        Commands::Training => handle_training(&cli).await?,
    }

    println!("{} Done in {:.2?}", "✓".green(), start.elapsed());
    Ok(())
}

/// Handle the 'run' command
async fn handle_run(
    cli: &Cli,
    settings: RunSettings,
    output_schema: &str,
    output_table: &str,
    snapshot: &Path,
) -> Result<()> {
    let config = DatabaseConfig::from_env().context("Failed to load database configuration")?;
    let warehouse = PostgresSource::connect(&config)
        .await
        .context("Failed to connect to Postgres")?;

    let table_sink = PostgresSink::new(warehouse.pool().clone(), output_schema, output_table)
        .context("Invalid output location")?;

    let training: Arc<dyn TableSource> = if cli.from_database {
        Arc::new(warehouse)
    } else {
        Arc::new(FileSource::new(&cli.data_dir))
    };

    let summary = build_pipeline(cli, training, settings)
        .with_sink(Arc::new(table_sink))
        .with_sink(Arc::new(ParquetSnapshotSink::new(snapshot)))
        .run()
        .await?;

    println!(
        "{} Published {} predictions ({} regions x up to {} candidates) to {}.{} and {}",
        "✓".green(),
        summary.predictions,
        summary.regions,
        summary.candidates,
        output_schema,
        output_table,
        snapshot.display()
    );
    Ok(())
}

/// Handle 'run --dry-run': everything except persistence
async fn handle_dry_run(cli: &Cli, settings: RunSettings, show: usize) -> Result<()> {
    let memory = Arc::new(MemorySink::new());
    let summary = build_pipeline(cli, training_source(cli).await?, settings)
        .with_sink(memory.clone())
        .run()
        .await?;

    println!(
        "{}",
        format!(
            "Dry run: {} training rows, {} regions, {} candidates, {} predictions",
            summary.training_rows, summary.regions, summary.candidates, summary.predictions
        )
        .bold()
        .blue()
    );
    print_predictions(&memory.written().unwrap_or_default(), show);
    Ok(())
}

/// Handle the 'candidates' command
async fn handle_candidates(cli: &Cli, settings: RunSettings, show: usize) -> Result<()> {
    let pipeline = build_pipeline(cli, Arc::new(FileSource::new(&cli.data_dir)), settings);
    let candidates = pipeline.candidates().await?;

    print_candidates(&candidates, show);
    Ok(())
}

/// Handle the 'training' command
async fn handle_training(cli: &Cli) -> Result<()> {
    let settings = RunSettings {
        warehouse_schema: cli.schema.clone(),
        ..RunSettings::default()
    };
    let dataset = build_pipeline(cli, training_source(cli).await?, settings)
        .training_dataset()
        .await?;

    println!("{}", "Training dataset:".bold().blue());
    println!("{}Rows: {}", "• ".green(), dataset.rows.len());
    println!("{}Regions ({}): {}", "• ".green(), dataset.regions.len(), dataset.regions.join(", "));
    Ok(())
}

/// Warehouse if requested, otherwise the CSV mirror
async fn training_source(cli: &Cli) -> Result<Arc<dyn TableSource>> {
    if cli.from_database {
        let config = DatabaseConfig::from_env().context("Failed to load database configuration")?;
        let warehouse = PostgresSource::connect(&config)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Arc::new(warehouse))
    } else {
        Ok(Arc::new(FileSource::new(&cli.data_dir)))
    }
}

/// The catalog file is read as a table named after its stem, from its
/// directory
fn build_pipeline(cli: &Cli, training: Arc<dyn TableSource>, mut settings: RunSettings) -> RecommendationPipeline {
    let catalog_dir = cli
        .catalog
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if let Some(stem) = cli.catalog.file_stem() {
        settings.catalog_table = stem.to_string_lossy().into_owned();
    }

    RecommendationPipeline::new(
        training,
        Arc::new(FileSource::new(catalog_dir)),
        Arc::new(ForestTrainer::default()),
    )
    .with_settings(settings)
}

/// Print the first `show` rows of each region
fn print_predictions(predictions: &[Prediction], show: usize) {
    let mut current_region: Option<&str> = None;
    let mut shown = 0;

    for prediction in predictions {
        if current_region != Some(prediction.region.as_str()) {
            current_region = Some(prediction.region.as_str());
            shown = 0;
            println!("{}", format!("Region {}:", prediction.region).bold());
        }
        if shown >= show {
            continue;
        }
        shown += 1;
        println!(
            "  {}. {} ({}) [{}] - Score: {:.2}",
            shown.to_string().green(),
            prediction.name.as_deref().unwrap_or("?"),
            prediction.release_year,
            prediction.primary_genre,
            prediction.predicted_score
        );
    }
}

fn print_candidates(candidates: &[CandidateMovie], show: usize) {
    println!("{}", format!("{} candidates:", candidates.len()).bold().blue());
    for (rank, candidate) in candidates.iter().take(show).enumerate() {
        println!(
            "{}. {} {} ({}) [{}] - {:.1} ({} votes)",
            (rank + 1).to_string().green(),
            candidate.external_id.as_deref().unwrap_or("?").dimmed(),
            candidate.name.as_deref().unwrap_or("?"),
            candidate.release_year,
            candidate.primary_genre,
            candidate.external_rating,
            candidate.external_rating_count
        );
    }
}
