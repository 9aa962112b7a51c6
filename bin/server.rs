// Monthly Transaction Summary - Web Server
// HTTP read surface over the aggregation pipeline.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use txn_summary::{aggregate_all, aggregate_for_account, QueryError, Store};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
}

/// Translate a facade error into the wire response. Aggregation detail goes
/// to the log, not to the caller.
fn error_response(err: QueryError) -> Response {
    let (status, message) = match &err {
        QueryError::StorageUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "DB not ready"),
        QueryError::InvalidIdentifier => (StatusCode::BAD_REQUEST, "Invalid user id"),
        QueryError::AccountNotFound => (StatusCode::NOT_FOUND, "User not found"),
        QueryError::Aggregation(e) => {
            tracing::error!("aggregation failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load transactions")
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}

/// GET /status - Health check. Answers before storage is ready.
async fn status() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// GET / - Monthly groups across all accounts.
async fn all_months(State(state): State<AppState>) -> Response {
    match aggregate_all(&state.store) {
        Ok(groups) => (StatusCode::OK, Json(groups)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /:userId - Monthly groups for one account.
async fn account_months(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match aggregate_for_account(&state.store, &user_id) {
        Ok(groups) => (StatusCode::OK, Json(groups)).into_response(),
        Err(e) => error_response(e),
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/", get(all_months))
        .route("/:user_id", get(account_months))
        .with_state(state)
        // Request logs at INFO so they show under the default filter.
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);
    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "accounts.db".to_string());

    tracing::info!("Starting transaction summary service");
    tracing::info!("Database path: {}", db_path);

    let store = Arc::new(Store::new());
    let state = AppState {
        store: store.clone(),
    };

    // Connect in the background so /status answers immediately; queries that
    // arrive before the connection is up observe 503, never a crash. Failing
    // to establish the initial connection is fatal.
    let _connect = tokio::task::spawn_blocking(move || {
        match store.connect(std::path::Path::new(&db_path)) {
            Ok(()) => tracing::info!("Successfully connected to database"),
            Err(e) => {
                tracing::error!("Database connection failed: {:#}", e);
                std::process::exit(1);
            }
        }
    });

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Transaction summary service running on http://{}", addr);

    axum::serve(listener, app(state))
        .await
        .expect("Failed to start server");
}
