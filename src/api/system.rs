use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiResponse, StatusResponse};
use crate::state::SharedState;

/// GET /api/system/status
pub async fn get_status(State(state): State<Arc<SharedState>>) -> Json<ApiResponse<StatusResponse>> {
    Json(ApiResponse::success(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}
