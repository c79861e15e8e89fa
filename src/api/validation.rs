use super::ApiError;
use crate::constants::limits;

fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::field_validation(
            field,
            format!("Must be between {} and {} characters", min, max),
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    validate_length(
        "username",
        username,
        limits::USERNAME_MIN,
        limits::USERNAME_MAX,
    )
}

pub fn validate_display_name(name: &str) -> Result<(), ApiError> {
    validate_length(
        "display_name",
        name,
        limits::DISPLAY_NAME_MIN,
        limits::DISPLAY_NAME_MAX,
    )
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    validate_length(
        "password",
        password,
        limits::PASSWORD_MIN,
        limits::PASSWORD_MAX,
    )
}

pub fn validate_label(label: &str) -> Result<(), ApiError> {
    validate_length("label", label, limits::LABEL_MIN, limits::LABEL_MAX)
}

pub fn validate_target_url(url: &str) -> Result<(), ApiError> {
    validate_length("target_url", url, 1, limits::TARGET_URL_MAX)
}

pub fn validate_dimension(field: &'static str, value: i32) -> Result<i32, ApiError> {
    if !(limits::DIMENSION_MIN..=limits::DIMENSION_MAX).contains(&value) {
        return Err(ApiError::field_validation(
            field,
            format!(
                "Must be between {} and {}",
                limits::DIMENSION_MIN,
                limits::DIMENSION_MAX
            ),
        ));
    }
    Ok(value)
}

pub fn validate_sort_order(value: i32) -> Result<i32, ApiError> {
    if !(limits::SORT_ORDER_MIN..=limits::SORT_ORDER_MAX).contains(&value) {
        return Err(ApiError::field_validation(
            "sort_order",
            format!(
                "Must be between {} and {}",
                limits::SORT_ORDER_MIN,
                limits::SORT_ORDER_MAX
            ),
        ));
    }
    Ok(value)
}

pub fn validate_icon_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid icon ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

/// Prefix bare addresses with a scheme, once, at creation time.
///
/// The check is a substring match, so anything already mentioning "htt"
/// anywhere is left alone. Stored values are never re-normalized.
#[must_use]
pub fn normalize_target_url(url: &str) -> String {
    if url.contains("htt") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
