use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::admission::BucketSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub audit_table: String,
    pub audit_records: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Response {
    match state.store.len().await {
        Ok(records) => Json(SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
            audit_table: state.store.table().to_string(),
            audit_records: records,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Audit store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "Audit store unavailable").into_response()
        }
    }
}

pub async fn get_admission(State(state): State<AdminState>) -> Json<BucketSnapshot> {
    Json(state.bucket.snapshot())
}

pub async fn get_audit_record(
    State(state): State<AdminState>,
    Path(request_id): Path<String>,
) -> Response {
    match state.store.get(&request_id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Audit record not found").into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Audit lookup failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Audit store unavailable").into_response()
        }
    }
}
