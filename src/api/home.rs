use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_account_id_opt;
use super::{ApiError, ApiResponse, HomeResponse, IconDto};
use crate::state::SharedState;
use crate::{greeting, layout};

/// GET /api/home
/// The start page payload: a greeting on the reference wall clock and the
/// visitor's icon wall. Anonymous visitors get the fallback name and an
/// empty grid.
pub async fn home(
    State(state): State<Arc<SharedState>>,
    session: Session,
) -> Result<Json<ApiResponse<HomeResponse>>, ApiError> {
    let account = match session_account_id_opt(&session).await? {
        Some(id) => state
            .store
            .find_account_by_id(id)
            .await
            .map_err(|e| ApiError::database(format!("Failed to load account: {e}")))?,
        None => None,
    };

    let hour = greeting::reference_hour(Utc::now());

    let (welcome, icons) = match account {
        Some(account) => {
            let icons = state
                .store
                .list_icons_by_owner(account.id)
                .await
                .map_err(|e| ApiError::database(format!("Failed to load icons: {e}")))?;
            (greeting::greet(hour, &account.display_name), icons)
        }
        None => (greeting::greet(hour, greeting::ANONYMOUS_NAME), Vec::new()),
    };

    let grid = layout::grid_for(icons.len());

    Ok(Json(ApiResponse::success(HomeResponse {
        greeting: welcome,
        icons: icons.into_iter().map(IconDto::from).collect(),
        grid,
    })))
}
