use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::Field},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_account_id;
use super::{ApiError, ApiResponse, IconDto, MessageResponse, ProfileResponse, validation};
use crate::db::NewIcon;
use crate::layout;
use crate::services::{AccountSummary, MediaKind};
use crate::state::SharedState;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<Arc<SharedState>>,
    session: Session,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let account_id = session_account_id(&session).await?;

    let account = state.auth.account_summary(account_id).await?;
    let icons = state
        .store
        .list_icons_by_owner(account_id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load icons: {e}")))?;

    let grid = layout::grid_for(icons.len());

    Ok(Json(ApiResponse::success(ProfileResponse {
        account,
        icons: icons.into_iter().map(IconDto::from).collect(),
        grid,
    })))
}

/// POST /api/profile/picture
/// Replace the profile picture with an uploaded image.
pub async fn update_picture(
    State(state): State<Arc<SharedState>>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AccountSummary>>, ApiError> {
    let account_id = session_account_id(&session).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
            upload = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::field_validation("image", "A picture file is required"))?;

    let stored = state
        .media
        .accept_upload(data, &file_name, MediaKind::Profile)
        .await?;

    state
        .store
        .update_profile_image(account_id, &stored)
        .await
        .map_err(|e| ApiError::database(format!("Failed to update profile picture: {e}")))?;

    let account = state.auth.account_summary(account_id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// POST /api/profile/icons
/// Create a new icon from the multipart form on the profile page.
pub async fn create_icon(
    State(state): State<Arc<SharedState>>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<ApiResponse<IconDto>>, ApiError> {
    let account_id = session_account_id(&session).await?;

    let form = IconForm::from_multipart(multipart).await?;

    validation::validate_label(&form.label)?;
    validation::validate_target_url(&form.target_url)?;
    let width = validation::validate_dimension("width", form.width)?;
    let height = validation::validate_dimension("height", form.height)?;
    let sort_order = validation::validate_sort_order(form.sort_order)?;

    let stored = state
        .media
        .accept_upload(form.image_data, &form.image_name, MediaKind::Icon)
        .await?;

    let icon = state
        .store
        .create_icon(
            account_id,
            NewIcon {
                label: form.label,
                image: stored,
                sort_order,
                width,
                height,
                target_url: validation::normalize_target_url(&form.target_url),
            },
        )
        .await
        .map_err(|e| ApiError::database(format!("Failed to create icon: {e}")))?;

    Ok(Json(ApiResponse::success(IconDto::from(icon))))
}

/// DELETE /api/profile/icons/{id}
/// Remove one icon. Ids that do not exist, or belong to someone else, are
/// both a plain 404.
pub async fn delete_icon(
    State(state): State<Arc<SharedState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let account_id = session_account_id(&session).await?;
    validation::validate_icon_id(id)?;

    let icon = state
        .store
        .get_icon(id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to load icon: {e}")))?;

    match icon {
        Some(icon) if icon.account_id == account_id => {
            state
                .store
                .delete_icon(id)
                .await
                .map_err(|e| ApiError::database(format!("Failed to delete icon: {e}")))?;

            tracing::info!("Deleted icon {} for account {}", id, account_id);

            Ok(Json(ApiResponse::success(MessageResponse {
                message: "Item deleted.".to_string(),
            })))
        }
        _ => Err(ApiError::not_found("Icon", id)),
    }
}

// ============================================================================
// Multipart form
// ============================================================================

/// Collected fields of the icon-creation form.
struct IconForm {
    label: String,
    target_url: String,
    width: i32,
    height: i32,
    sort_order: i32,
    image_name: String,
    image_data: Vec<u8>,
}

impl IconForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut label = None;
        let mut target_url = None;
        let mut width = None;
        let mut height = None;
        let mut sort_order = None;
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed upload: {e}")))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::validation(format!("Failed to read upload: {e}"))
                    })?;
                    image = Some((file_name, data.to_vec()));
                }
                "label" => label = Some(text_field(field, "label").await?),
                "target_url" => target_url = Some(text_field(field, "target_url").await?),
                "width" => width = Some(int_field(field, "width").await?),
                "height" => height = Some(int_field(field, "height").await?),
                "sort_order" => sort_order = Some(int_field(field, "sort_order").await?),
                _ => {}
            }
        }

        let (image_name, image_data) =
            image.ok_or_else(|| missing_field("image"))?;

        Ok(Self {
            label: label.ok_or_else(|| missing_field("label"))?,
            target_url: target_url.ok_or_else(|| missing_field("target_url"))?,
            width: width.ok_or_else(|| missing_field("width"))?,
            height: height.ok_or_else(|| missing_field("height"))?,
            sort_order: sort_order.ok_or_else(|| missing_field("sort_order"))?,
            image_name,
            image_data,
        })
    }
}

fn missing_field(name: &'static str) -> ApiError {
    ApiError::field_validation(name, "This field is required")
}

async fn text_field(field: Field<'_>, name: &'static str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::field_validation(name, "Invalid value"))
}

async fn int_field(field: Field<'_>, name: &'static str) -> Result<i32, ApiError> {
    let text = text_field(field, name).await?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::field_validation(name, "Must be a whole number"))
}
