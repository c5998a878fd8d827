use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    mine::mine_next_block, pow::ProofSearch, resolve_conflicts, ChainSnapshot, ChainSource,
    LedgerError, PeerRegistry, SharedLedger,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Everything a request handler can touch. Owned by `main`, cloned per route.
#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub peers: Arc<RwLock<PeerRegistry>>,
    pub source: Arc<dyn ChainSource>,
    pub node_id: Arc<str>,
    pub search: ProofSearch,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: f64,
}

#[derive(Deserialize)]
struct NodesIn {
    #[serde(default)]
    nodes: Vec<NodeIn>,
}

#[derive(Deserialize)]
struct NodeIn {
    address: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error: Invalid request payload")]
    InvalidPayload,
    #[error("Error: Please provide a valid list of nodes")]
    NoNodes,
    #[error("Error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload | ApiError::NoNodes => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(
                LedgerError::ProofSearchCancelled | LedgerError::ProofSearchExhausted { .. },
            ) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ledger(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "message": self.to_string(), "status_code": status.as_u16() });
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<(StatusCode, Json<serde_json::Value>), ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok index" }))
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/healthz", get(|| async { Json(Health { status: "ok" }) }))
        .route("/transactions/new", post(new_transaction))
        .route("/mine", get(mine))
        .route("/chain", get(chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn new_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TxIn>, JsonRejection>,
) -> ApiResult {
    let Json(tx) = payload.map_err(|e| {
        warn!(error = %e, "rejecting transaction payload");
        ApiError::InvalidPayload
    })?;
    if tx.sender.is_empty() || tx.recipient.is_empty() || !(tx.amount.is_finite() && tx.amount > 0.0)
    {
        return Err(ApiError::InvalidPayload);
    }

    let index = state
        .ledger
        .lock()
        .enqueue_transaction(tx.sender, tx.recipient, tx.amount);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Success: Transaction will be added to block {index}"),
            "status_code": StatusCode::CREATED.as_u16(),
        })),
    ))
}

async fn mine(State(state): State<AppState>) -> ApiResult {
    let ledger = Arc::clone(&state.ledger);
    let node_id = Arc::clone(&state.node_id);
    let search = state.search.clone();
    let block = tokio::task::spawn_blocking(move || mine_next_block(&ledger, &node_id, &search))
        .await
        .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))??;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Success: New block mined {}", block.index),
            "block": block,
            "status_code": StatusCode::CREATED.as_u16(),
        })),
    ))
}

async fn chain(State(state): State<AppState>) -> Json<ChainSnapshot> {
    let chain = state.ledger.lock().chain();
    Json(ChainSnapshot::new(chain.as_ref().clone()))
}

async fn register_nodes(
    State(state): State<AppState>,
    payload: Result<Json<NodesIn>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "rejecting node registration payload");
        ApiError::InvalidPayload
    })?;
    if body.nodes.is_empty() {
        return Err(ApiError::NoNodes);
    }

    let mut registry = state.peers.write();
    let mut added = 0usize;
    let mut rejected = Vec::new();
    for node in body.nodes {
        match registry.register(&node.address, node.comment) {
            Ok(_) => added += 1,
            Err(e) => {
                warn!(address = %node.address, error = %e, "skipping peer address");
                rejected.push(node.address);
            }
        }
    }
    if added == 0 {
        return Err(LedgerError::InvalidInput(format!(
            "no valid node address among {rejected:?}"
        ))
        .into());
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Success: {added} node(s) successfully added"),
            "nodes": &*registry,
            "rejected": rejected,
            "status_code": StatusCode::CREATED.as_u16(),
        })),
    ))
}

async fn resolve(State(state): State<AppState>) -> ApiResult {
    let replaced = resolve_with(&state).await;
    let chain = state.ledger.lock().chain();
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": message,
            "replaced": replaced,
            "chain": chain.as_ref(),
            "status_code": StatusCode::OK.as_u16(),
        })),
    ))
}

/// One resolution pass against every registered peer.
pub async fn resolve_with(state: &AppState) -> bool {
    let addresses = state.peers.read().addresses();
    info!(peers = addresses.len(), "resolving conflicts");
    resolve_conflicts(&state.ledger, &addresses, state.source.as_ref()).await
}
