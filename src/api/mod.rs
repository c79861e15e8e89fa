use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::state::SharedState;

mod assets;
pub mod auth;
mod error;
mod home;
mod profile;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

pub async fn router(state: Arc<SharedState>) -> Router {
    let (media_path, cors_origins, secure_cookies, session_minutes) = {
        let config = state.config.read().await;
        (
            config.media.media_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_router())
        .route("/home", get(home::home))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/media", ServeDir::new(media_path))
        .fallback(assets::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn protected_router() -> Router<Arc<SharedState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/profile", get(profile::get_profile))
        .route("/profile/picture", post(profile::update_picture))
        .route("/profile/icons", post(profile::create_icon))
        .route("/profile/icons/{id}", delete(profile::delete_icon))
        .route("/system/status", get(system::get_status))
        .route_layer(middleware::from_fn(auth::require_session))
}
