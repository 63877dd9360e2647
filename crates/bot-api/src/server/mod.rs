use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bot_core::TierTableError;
use contracts::{
    Accrual, ActivityEvent, ApiError, BotConfig, Command, CommandReply, ErrorCode, Event,
    LedgerSnapshot, MilestoneNotice, QueryResponse, SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};

use crate::{milestone_text, BotApi};

const DEFAULT_PAGE_SIZE: usize = 500;
const MAX_PAGE_SIZE: usize = 5000;

include!("error.rs");
include!("state.rs");
include!("routes/activity.rs");
include!("routes/commands.rs");
include!("routes/query.rs");
include!("routes/stream.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr, config: BotConfig) -> Result<(), ServerError> {
    let api = BotApi::from_config(config).map_err(ServerError::Config)?;
    let state = AppState::new(api);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "points api listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/activity", post(submit_activity))
        .route("/api/v1/commands", post(submit_command))
        .route("/api/v1/users/{user_id}/points", get(get_points))
        .route(
            "/api/v1/users/{user_id}/available-roles",
            get(get_available_roles),
        )
        .route("/api/v1/roles", get(get_all_roles))
        .route("/api/v1/ledger", get(get_ledger))
        .route("/api/v1/events", get(get_events))
        .route("/api/v1/stream", get(stream_events))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
