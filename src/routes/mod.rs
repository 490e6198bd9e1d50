pub mod rides;
pub mod scooters;
pub mod users;

use std::sync::Arc;

use axum::{extract::Extension, response::Json as RespJson, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::collaborators::PaymentGateway;
use crate::config::Config;
use crate::ledger::RideLedger;

/// Handles shared with every handler through `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RideLedger>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(ledger: Arc<RideLedger>, gateway: Arc<dyn PaymentGateway>, config: Config) -> Self {
        Self {
            ledger,
            gateway,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(scooters::scooter_router())
        .merge(rides::ride_router())
        .nest("/api/users", users::users_router())
        .route("/api/health", get(health))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

async fn health() -> RespJson<serde_json::Value> {
    RespJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now()
    }))
}
