pub mod auth_service;
pub use auth_service::{AccountSummary, AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod media;
pub use media::{MediaError, MediaKind, MediaService};
