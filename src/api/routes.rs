//! Router assembly and shared application state.

use axum::{
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{finance, logs, manifest, payments, upload};
use crate::audit::AuditLogger;
use crate::auth::actor_middleware;
use crate::finance::FinanceEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: FinanceEngine,
    pub audit: AuditLogger,
    pub http_client: reqwest::Client,
    pub media_store_url: Option<String>,
}

/// Build the full application router. Everything under /api requires a
/// resolved actor identity; /health stays public for probes.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/payments", post(payments::create_payment))
        .route(
            "/api/payments/:id",
            put(payments::update_payment).delete(payments::delete_payment),
        )
        .route(
            "/api/manifest",
            post(manifest::create_pilgrim).get(manifest::list_pilgrims),
        )
        .route(
            "/api/manifest/:id",
            get(manifest::get_pilgrim).delete(manifest::delete_pilgrim),
        )
        .route(
            "/api/manifest/:id/payment",
            post(payments::create_manifest_payment),
        )
        .route("/api/manifest/:id/refund", post(manifest::refund_pilgrim))
        .route(
            "/api/finance",
            get(finance::list_ledger).post(finance::create_ledger_entry),
        )
        .route("/api/finance/summary", get(finance::finance_summary))
        .route("/api/logs", get(logs::list_logs))
        .route("/api/upload", post(upload::upload_proof))
        .route_layer(middleware::from_fn(actor_middleware))
        .with_state(state);

    let public = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
