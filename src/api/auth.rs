use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, LoginRequest, MessageResponse, RegisterRequest, validation};
use crate::services::AccountSummary;
use crate::state::SharedState;

/// Session key holding the signed-in account id.
pub(crate) const SESSION_ACCOUNT_KEY: &str = "account_id";

// ============================================================================
// Middleware
// ============================================================================

/// Guards the protected routes: a request without a live session is turned
/// away before its handler runs.
pub async fn require_session(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    session_account_id(&session).await?;
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
/// Create a new account. The client navigates to the login form afterwards.
pub async fn register(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validation::validate_username(&payload.username)?;
    validation::validate_display_name(&payload.display_name)?;
    validation::validate_password(&payload.password)?;

    state
        .auth
        .register(&payload.username, &payload.display_name, &payload.password)
        .await?;

    tracing::info!("Registered account: {}", payload.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Account created.".to_string(),
    })))
}

/// POST /api/auth/login
/// Verify credentials and start a session. A failed attempt gets a plain
/// unauthorized response that does not say which half was wrong.
pub async fn login(
    State(state): State<Arc<SharedState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AccountSummary>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::field_validation("username", "Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::field_validation("password", "Password is required"));
    }

    let account = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;

    session
        .insert(SESSION_ACCOUNT_KEY, account.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(account)))
}

/// POST /api/auth/logout
/// Drop the session entirely.
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out.".to_string(),
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Account id from the session, or an unauthorized error.
pub(crate) async fn session_account_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))
}

/// Account id if a session exists, without requiring one.
pub(crate) async fn session_account_id_opt(session: &Session) -> Result<Option<i32>, ApiError> {
    session
        .get::<i32>(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}
