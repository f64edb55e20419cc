//! API Server Module
//!
//! This module implements the JSON-RPC server exposing the verification and
//! catalog operations. Every method maps onto one service call; services
//! never fail, so JSON-RPC errors only describe malformed requests.

use crate::{
    backend::LedgerBackend,
    catalog::{BatchLister, BatchSearcher, LedgerInspector, ListBatchesRequest, SearchBatchesRequest},
    config::Config,
    hints::HintNormalizer,
    verification::{BatchVerifier, TransactionVerifier, VerifyBatchRequest, VerifyTransactionRequest},
};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_REQUEST: i32 = -32600;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// Shared application state that is accessible across all request handlers
///
/// Every service holds the same backend handle:
/// - `transactions`/`batches`: verification orchestrators
/// - `lister`/`searcher`: batch catalog
/// - `inspector`: batch, NFT, contract and configuration lookups
#[derive(Clone)]
pub struct AppState {
    transactions: Arc<TransactionVerifier>,
    batches: Arc<BatchVerifier>,
    lister: Arc<BatchLister>,
    searcher: Arc<BatchSearcher>,
    inspector: Arc<LedgerInspector>,
}

impl AppState {
    pub fn new(config: &Config, backend: Arc<dyn LedgerBackend>) -> Self {
        let normalizer = HintNormalizer::new(config.verification.time_range_policy());

        Self {
            transactions: Arc::new(TransactionVerifier::new(
                backend.clone(),
                normalizer,
                config.verification.position_scan_window,
            )),
            batches: Arc::new(BatchVerifier::new(backend.clone(), normalizer)),
            lister: Arc::new(BatchLister::new(backend.clone())),
            searcher: Arc::new(BatchSearcher::new(backend.clone())),
            inspector: Arc::new(LedgerInspector::new(backend, config.ledger.clone())),
        }
    }
}

/// The main API server struct
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Server configuration (host, port, ledger identity)
    /// * `backend` - Ledger backend shared by every service
    pub fn new(config: Config, backend: Arc<dyn LedgerBackend>) -> Self {
        let state = AppState::new(&config, backend);
        Self { config, state }
    }

    /// Starts the API server and begins listening for incoming requests
    ///
    /// # Returns
    /// `Ok(())` when the server shuts down, or an error if binding fails
    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.state);

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// JSON-RPC on `POST /`, liveness on `GET /healthz`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC 2.0 response structure
///
/// Either `result` or `error` is populated, never both.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchIdParams {
    batch_id: String,
}

#[derive(Debug, Deserialize)]
struct NftParams {
    nft_token_id: String,
}

/// Main RPC request handler
///
/// Routes the request to the service matching the method name. Bodies that
/// are not JSON, or not a request object, still get a JSON-RPC error.
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Rejecting unparseable request body: {}", e);
            return Json(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    let id = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting malformed request: {}", e);
            return Json(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Invalid Request: {}", e),
            ));
        }
    };

    info!("Received RPC request: {}", request.method);

    if request.jsonrpc != "2.0" {
        warn!("Rejecting request with jsonrpc version {:?}", request.jsonrpc);
        return Json(JsonRpcResponse::failure(
            request.id,
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ));
    }

    let id = request.id;
    let params = request.params;

    let outcome = match request.method.as_str() {
        "verify_transaction" => match decode::<VerifyTransactionRequest>(params) {
            Ok(req) => encode(state.transactions.verify(req).await),
            Err(e) => Err(e),
        },
        "verify_batch" => match decode::<VerifyBatchRequest>(params) {
            Ok(req) => encode(state.batches.verify(req).await),
            Err(e) => Err(e),
        },
        "get_batch" => match decode::<BatchIdParams>(params) {
            Ok(req) => encode(state.inspector.get_batch(&req.batch_id).await),
            Err(e) => Err(e),
        },
        "get_nft" => match decode::<NftParams>(params) {
            Ok(req) => encode(state.inspector.get_nft(&req.nft_token_id).await),
            Err(e) => Err(e),
        },
        "list_batches" => match decode::<ListBatchesRequest>(params) {
            Ok(req) => encode(state.lister.list(req).await),
            Err(e) => Err(e),
        },
        "search_batches" => match decode::<SearchBatchesRequest>(params) {
            Ok(req) => encode(state.searcher.search(req).await),
            Err(e) => Err(e),
        },
        "get_contract_info" => encode(state.inspector.get_contract_info().await),
        "get_config" => encode(state.inspector.get_config()),
        _ => Err((METHOD_NOT_FOUND, "Method not found".to_string())),
    };

    Json(match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err((code, message)) => JsonRpcResponse::failure(id, code, message),
    })
}

/// Decode method parameters; absent params read as an empty object
fn decode<T: DeserializeOwned>(params: Value) -> Result<T, (i32, String)> {
    let params = match params {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    serde_json::from_value(params).map_err(|e| {
        error!("Failed to deserialize params: {}", e);
        (INVALID_PARAMS, format!("Invalid params: {}", e))
    })
}

fn encode<T: Serialize>(result: T) -> Result<Value, (i32, String)> {
    serde_json::to_value(result).map_err(|e| {
        error!("Failed to serialize result: {}", e);
        (INTERNAL_ERROR, format!("Internal error: {}", e))
    })
}
