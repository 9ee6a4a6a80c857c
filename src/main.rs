use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

mod classify;
mod config;
mod db;
mod engagement;
mod engine;
mod error;
mod models;
mod report;
mod roi;
mod server;
mod signals;
mod store;

use crate::db::PgStore;
use crate::models::RunRequest;
use crate::store::ScoringStore;

#[derive(Parser)]
#[command(name = "engagement-scoring")]
#[command(about = "Client engagement and ROI scoring engine", long_about = None)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long, env = "SCORING_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo account with clients and events
    Seed,
    /// Import classified ROI events from a CSV file
    ImportRoi {
        #[arg(long)]
        account: Uuid,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score clients and append one snapshot per client
    Run {
        #[arg(long)]
        account: Option<Uuid>,
        #[arg(long, requires = "account")]
        client: Option<Uuid>,
    },
    /// Serve the scoring trigger over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        bind: String,
    },
    /// Generate a markdown report from the latest snapshots
    Report {
        #[arg(long)]
        account: Uuid,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(cli.max_connections)
        .connect(&cli.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool);

    match cli.command {
        Commands::InitDb => {
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(store.pool()).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportRoi { account, csv } => {
            let inserted = db::import_value_events(store.pool(), account, &csv).await?;
            println!("Inserted {inserted} ROI events from {}.", csv.display());
        }
        Commands::Run { account, client } => {
            let request = RunRequest {
                account_id: account,
                client_id: client,
            };
            let summary = engine::run(&store, &request, Utc::now())
                .await
                .context("scoring run failed")?;

            println!("{}", summary.message);
            for result in summary.results.iter() {
                println!(
                    "- account {}: {} clients scored, {} errors",
                    result.account_id,
                    result.clients_processed,
                    result.errors.len()
                );
                for err in result.errors.iter() {
                    println!("    {err}");
                }
            }
        }
        Commands::Serve { bind } => {
            let store: Arc<dyn ScoringStore> = Arc::new(store);
            let app = server::build_router(server::AppState::new(store));
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!("engagement-scoring listening on http://{bind}");
            axum::serve(listener, app).await?;
        }
        Commands::Report { account, out } => {
            let settings = store.load_settings(account).await?.unwrap_or_default();
            let snapshots = store.fetch_latest_snapshots(account).await?;
            let report = report::build_report(account, Utc::now(), &snapshots, &settings);
            report::write_report(&out, &report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
