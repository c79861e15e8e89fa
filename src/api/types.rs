use serde::{Deserialize, Serialize};

use crate::db::IconLink;
use crate::layout::GridShape;
use crate::services::AccountSummary;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Form field the error belongs to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            field: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            field: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IconDto {
    pub id: i32,
    pub label: String,
    pub image: String,
    pub sort_order: i32,
    pub width: i32,
    pub height: i32,
    pub target_url: String,
}

impl From<IconLink> for IconDto {
    fn from(icon: IconLink) -> Self {
        Self {
            id: icon.id,
            label: icon.label,
            image: icon.image,
            sort_order: icon.sort_order,
            width: icon.width,
            height: icon.height,
            target_url: icon.target_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub greeting: String,
    pub icons: Vec<IconDto>,
    pub grid: GridShape,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub account: AccountSummary,
    pub icons: Vec<IconDto>,
    pub grid: GridShape,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
}
