use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockwatch_core::StockRecordId;

use crate::app::dto::{self, StockRecordResponse, TransactionResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(record_transaction).delete(delete_item))
}

fn parse_id(raw: &str) -> Result<StockRecordId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id())
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_records().await {
        Ok(records) => {
            let body: Vec<StockRecordResponse> = records.iter().map(StockRecordResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    match services.create_record(body.into()).await {
        Ok(record) => (StatusCode::CREATED, Json(StockRecordResponse::from(&record))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.get_record(id).await {
        Ok(record) => (StatusCode::OK, Json(StockRecordResponse::from(&record))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// Applies the transaction and answers immediately; alert delivery continues
/// in the background.
pub async fn record_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransactionRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = match body.into_command() {
        Ok(cmd) => cmd,
        Err(msg) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_amount", msg),
    };

    match services.record_transaction(id, cmd).await {
        Ok(outcome) => (StatusCode::OK, Json(TransactionResponse::from(&outcome))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.delete_record(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Item deleted" })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
