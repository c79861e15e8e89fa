//! Upload intake for profile pictures and icon images.
//!
//! Every accepted file is renamed with a random prefix, shrunk to fit the
//! thumbnail bounding box and written under the media root. The background
//! directory is provisioned like the others even though nothing uploads
//! into it yet.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use image::imageops::FilterType;
use thiserror::Error;
use tokio::fs;
use tokio::task;
use tracing::info;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::constants::{IMAGE_EXTENSIONS, media};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Only .png and .jpg images are allowed")]
    UnsupportedExtension,

    #[error("Could not read the file as an image")]
    Decode,

    #[error("Could not encode the resized image")]
    Encode,

    #[error("Failed to store the image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy)]
pub enum MediaKind {
    Profile,
    Background,
    Icon,
}

impl MediaKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Background => "background",
            Self::Icon => "icon",
        }
    }
}

pub struct MediaService {
    config: MediaConfig,
}

impl MediaService {
    #[must_use]
    pub const fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        PathBuf::from(&self.config.media_path).join(kind.as_str())
    }

    /// Create the per-kind directories and drop in the placeholder images
    /// that fresh accounts reference.
    pub async fn ensure_directories(&self) -> Result<(), MediaError> {
        for kind in [MediaKind::Profile, MediaKind::Background, MediaKind::Icon] {
            fs::create_dir_all(self.kind_dir(kind)).await?;
        }

        let placeholders = [
            (MediaKind::Profile, media::DEFAULT_PROFILE_IMAGE),
            (MediaKind::Background, media::DEFAULT_BACKGROUND_IMAGE),
        ];

        for (kind, filename) in placeholders {
            let path = self.kind_dir(kind).join(filename);
            if !path.exists() {
                fs::write(&path, placeholder_png()?).await?;
            }
        }

        Ok(())
    }

    /// Validate, rename, shrink and persist an uploaded image. Returns the
    /// stored filename.
    pub async fn accept_upload(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        kind: MediaKind,
    ) -> Result<String, MediaError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or(MediaError::UnsupportedExtension)?;

        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(MediaError::UnsupportedExtension);
        }

        let format = if extension == "png" {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        };

        let filename = format!(
            "{}_{}.{}",
            Uuid::new_v4().simple(),
            sanitize_stem(original_name),
            extension
        );

        // Decode and resize off the async runtime; both are CPU-bound.
        let encoded = task::spawn_blocking(move || -> Result<Vec<u8>, MediaError> {
            let img = image::load_from_memory(&bytes).map_err(|_| MediaError::Decode)?;
            let thumb = img.resize(
                media::THUMBNAIL_MAX_WIDTH,
                media::THUMBNAIL_MAX_HEIGHT,
                FilterType::Lanczos3,
            );

            let mut output = Cursor::new(Vec::new());
            thumb
                .write_to(&mut output, format)
                .map_err(|_| MediaError::Encode)?;
            Ok(output.into_inner())
        })
        .await
        .map_err(|e| MediaError::Task(e.to_string()))??;

        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(&filename);
        fs::write(&path, encoded).await?;

        info!(file = %path.display(), "Stored uploaded image");
        Ok(filename)
    }
}

/// Keep only filesystem-safe characters from the original file stem.
fn sanitize_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");

    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(media::MAX_STEM_CHARS)
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Single-color image written where a placeholder file is missing.
fn placeholder_png() -> Result<Vec<u8>, MediaError> {
    let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([210, 210, 210, 255]));
    let mut output = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut output, ImageFormat::Png)
        .map_err(|_| MediaError::Encode)?;
    Ok(output.into_inner())
}
