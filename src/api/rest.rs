// REST API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::sync::watch;

use super::{ErrorResponse, LookupResponse};
use crate::error::RouterError;
use crate::routes::{lookup, TableSnapshot};

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
pub struct AppState {
    snapshots: watch::Receiver<TableSnapshot>,
}

impl AppState {
    pub fn new(snapshots: watch::Receiver<TableSnapshot>) -> Self {
        AppState { snapshots }
    }
}

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/routing-table", get(get_routing_table))
        .route("/api/lookup/:addr", get(lookup_route))
        .with_state(state)
}

/// Serves the API until the listener fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Status API listening on http://{}", addr);
    tracing::info!("  GET  http://{}/api/routing-table", addr);
    tracing::info!("  GET  http://{}/api/lookup/{{addr}}", addr);
    axum::serve(listener, create_api_router(state)).await
}

async fn get_routing_table(State(state): State<AppState>) -> Json<TableSnapshot> {
    Json(state.snapshots.borrow().clone())
}

async fn lookup_route(
    State(state): State<AppState>,
    Path(addr): Path<String>,
) -> Result<Json<LookupResponse>, ApiError> {
    let dest: Ipv4Addr = addr.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "InvalidDestination".to_string(),
                message: format!("Not an IPv4 address: {}", addr),
            }),
        )
    })?;

    let snapshot = state.snapshots.borrow();
    let Some(route) = lookup::longest_match(&snapshot.routes, dest) else {
        let err = RouterError::NotFound(dest);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: err.code().to_string(),
                message: err.to_string(),
            }),
        ));
    };

    let next_hop = if route.is_direct() { dest } else { route.next_hop };
    Ok(Json(LookupResponse {
        destination: dest.to_string(),
        next_hop: next_hop.to_string(),
        out_interface: route.out_interface,
        matched_route: route.clone(),
    }))
}
