//! Alhijrah - Pilgrimage Travel Agency Backend
//! Mission: Keep the money reconciled — payments, balances, ledger, audit

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alhijrah_backend::{
    api::{create_router, AppState},
    audit::AuditLogger,
    finance::FinanceEngine,
    store::Database,
};

#[derive(Parser, Debug)]
#[command(name = "alhijrah", about = "Pilgrimage travel agency backend")]
struct Args {
    /// Address to bind the API server on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: String,

    /// Path to the SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "alhijrah.db")]
    db_path: String,

    /// External media store endpoint for proof uploads
    #[arg(long, env = "MEDIA_STORE_URL")]
    media_store_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alhijrah_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let db = Database::open(&args.db_path)?;
    let (audit, _audit_drain) = AuditLogger::spawn(db.clone());
    let engine = FinanceEngine::new(db, audit.clone());

    if args.media_store_url.is_none() {
        info!("Media store URL not set; /api/upload will report it as unavailable");
    }

    let state = AppState {
        engine,
        audit,
        http_client: reqwest::Client::new(),
        media_store_url: args.media_store_url,
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("🕋 Alhijrah backend listening on {}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
