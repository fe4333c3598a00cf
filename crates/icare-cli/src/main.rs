mod ingest;
mod open;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "icare-cli")]
#[command(about = "iCare command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Pull facility records from the public-data APIs
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },
    /// List facilities around a point with their operating state
    Open {
        /// Facility kind: pharmacy or hospital
        #[arg(long, default_value = "pharmacy")]
        kind: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Time phrase to evaluate at, e.g. "내일 오전 10시" (defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// nearest, earliest_open or latest_close
        #[arg(long)]
        sort: Option<String>,
        /// Search radius in km (defaults per kind)
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Debug, Subcommand)]
enum IngestCommands {
    /// Refresh every pharmacy from the NEMC full download
    Pharmacies {
        /// Rows requested per page
        #[arg(long, default_value = "1000")]
        rows: u32,
    },
    /// Refresh the hospitals of one region from HIRA
    Hospitals {
        /// Region name (서울, 경기)
        #[arg(long, default_value = "서울")]
        region: String,
        /// Concurrent detail/department lookups
        #[arg(long, default_value = "8")]
        workers: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("icare-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = icare_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = icare_db::PoolConfig::from_app_config(&config);
    let pool = icare_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = icare_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
        Commands::Ingest {
            command: IngestCommands::Pharmacies { rows },
        } => ingest::run_ingest_pharmacies(&pool, &config, rows).await?,
        Commands::Ingest {
            command: IngestCommands::Hospitals { region, workers },
        } => ingest::run_ingest_hospitals(&pool, &config, &region, workers).await?,
        Commands::Open {
            kind,
            lat,
            lng,
            at,
            sort,
            radius,
            limit,
        } => {
            let args = open::OpenArgs {
                kind: open::parse_kind(&kind)?,
                latitude: lat,
                longitude: lng,
                at,
                sort: sort
                    .as_deref()
                    .map(str::parse)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
                radius_km: radius,
                limit,
            };
            open::run_open(&pool, &config, &args).await?;
        }
    }

    Ok(())
}

/// Marks a run failed, logging instead of propagating if that also fails.
async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    context: &'static str,
    message: String,
) {
    if let Err(mark_err) = icare_db::fail_ingestion_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark {context} run as failed"
        );
    }
}
