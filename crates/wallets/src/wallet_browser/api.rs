//! HTTP surface of the bridge: the page at `/` and the token-gated `/api` it polls.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::wallet_browser::{
    state::BridgeState,
    types::{BrowserApiResponse, BrowserRequest, BrowserResponse, Connection},
};

/// Header carrying the per-server session token on every `/api` call.
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

const INDEX_HTML: &str = include_str!("assets/index.html");

type Bridge = State<Arc<BridgeState>>;

pub(crate) fn router(state: Arc<BridgeState>) -> Router {
    let api = Router::new()
        .route("/request", get(next_request))
        .route("/response", axum::routing::post(answer))
        .route("/connection", get(connection).post(update_connection))
        .route_layer(middleware::from_fn_with_state(state.clone(), check_token));
    Router::new().route("/", get(index)).nest("/api", api).with_state(state)
}

async fn check_token(State(state): Bridge, req: Request, next: Next) -> Response {
    let token = req.headers().get(SESSION_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if token != Some(state.token()) {
        return StatusCode::FORBIDDEN.into_response();
    }
    next.run(req).await
}

async fn index(State(state): Bridge) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Html(INDEX_HTML.replace("__SESSION_TOKEN__", state.token())),
    )
}

async fn connection(State(state): Bridge) -> Json<BrowserApiResponse<Option<Connection>>> {
    Json(BrowserApiResponse::Ok(state.connection()))
}

/// The page reports account and chain changes here, `null` on disconnect.
async fn update_connection(
    State(state): Bridge,
    Json(connection): Json<Option<Connection>>,
) -> Json<BrowserApiResponse> {
    match &connection {
        Some(c) => debug!(address = %c.address, chain_id = c.chain_id, "browser wallet connected"),
        None => debug!("browser wallet disconnected"),
    }
    state.set_connection(connection);
    Json(BrowserApiResponse::Ok(()))
}

async fn next_request(State(state): Bridge) -> Json<BrowserApiResponse<BrowserRequest>> {
    let response = match state.peek() {
        Some(request) => BrowserApiResponse::Ok(request),
        None => BrowserApiResponse::error("No pending request"),
    };
    Json(response)
}

async fn answer(
    State(state): Bridge,
    Json(response): Json<BrowserResponse>,
) -> Json<BrowserApiResponse> {
    if response.result.is_none() && response.error.is_none() {
        return Json(BrowserApiResponse::error("Response carries neither result nor error"));
    }
    if !state.resolve(response) {
        return Json(BrowserApiResponse::error("Unknown request id"));
    }
    Json(BrowserApiResponse::Ok(()))
}
