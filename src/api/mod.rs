use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;

use crate::hub::HubState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    agent_connected: bool,
    observer_count: usize,
    version: &'static str,
}

/// Routeur HTTP de supervision du hub
pub fn create_router(state: Arc<HubState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .with_state(state)
}

/// Sert l'API de statut sur l'adresse donnée
pub async fn serve(addr: String, state: Arc<HubState>) {
    let router = create_router(state);

    match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!("API de statut en écoute sur {}", addr);
            if let Err(e) = axum::serve(listener, router).await {
                error!("Arrêt de l'API de statut: {}", e);
            }
        }
        Err(e) => {
            error!("Impossible d'écouter sur {} pour l'API de statut: {}", addr, e);
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn status(State(state): State<Arc<HubState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        agent_connected: state.agent_connected().await,
        observer_count: state.observer_count(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
