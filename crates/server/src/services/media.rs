//! Image uploads.
//!
//! Clients send images inline as base64 data URIs
//! (`data:image/png;base64,...`). Decoded files are written under the media
//! root with random names; the database stores the path relative to the root
//! and [`crate::config::ServerConfig::media_url`] turns it into a URL.

use std::io;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted decoded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif", "webp"];

/// Errors from decoding or storing an uploaded image.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Not a base64 `data:image/...` URI.
    #[error("upload a valid image: {0}")]
    Invalid(&'static str),

    /// Image type we don't store.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// Decoded image exceeds [`MAX_IMAGE_BYTES`].
    #[error("image is larger than {} MiB", MAX_IMAGE_BYTES / 1024 / 1024)]
    TooLarge,

    /// Filesystem failure.
    #[error("media storage error: {0}")]
    Io(#[from] io::Error),
}

/// Where an upload belongs, which decides its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    RecipeImage,
    Avatar,
}

impl MediaKind {
    const fn directory(self) -> &'static str {
        match self {
            Self::RecipeImage => "recipes/images",
            Self::Avatar => "users",
        }
    }
}

/// A decoded upload ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decode a `data:image/<type>;base64,<payload>` URI.
///
/// # Errors
///
/// Returns `MediaError::Invalid` for anything that is not a base64 image data
/// URI, `MediaError::UnsupportedType` for image types outside the allow list,
/// and `MediaError::TooLarge` for oversized payloads.
pub fn parse_data_uri(input: &str) -> Result<DecodedImage, MediaError> {
    let rest = input
        .trim()
        .strip_prefix("data:image/")
        .ok_or(MediaError::Invalid("expected a data:image/... URI"))?;
    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or(MediaError::Invalid("expected base64 encoding"))?;

    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(MediaError::UnsupportedType(extension));
    }

    // base64 expands by 4/3; reject before decoding
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
        return Err(MediaError::TooLarge);
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| MediaError::Invalid("malformed base64 payload"))?;
    if bytes.is_empty() {
        return Err(MediaError::Invalid("the submitted file is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(MediaError::TooLarge);
    }

    Ok(DecodedImage { extension, bytes })
}

/// Filesystem-backed image storage rooted at the configured media directory.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write an image and return its path relative to the media root.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory or file cannot be written.
    pub async fn save(&self, kind: MediaKind, image: &DecodedImage) -> Result<String, MediaError> {
        let relative = format!(
            "{}/{}.{}",
            kind.directory(),
            Uuid::new_v4().simple(),
            image.extension
        );
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &image.bytes).await?;

        tracing::debug!(path = %relative, size = image.bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Remove a previously stored file. Missing files are ignored.
    pub async fn delete(&self, relative: &str) {
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            tracing::warn!(path = %relative, "Refusing to delete media path");
            return;
        }
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => tracing::debug!(path = %relative, "Deleted upload"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, error = %e, "Failed to delete upload"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_parse_png() {
        let image = parse_data_uri(PNG).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_rejects_non_data_uri() {
        assert!(matches!(
            parse_data_uri("https://example.com/cat.png"),
            Err(MediaError::Invalid(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png,rawbytes"),
            Err(MediaError::Invalid(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png;base64,!!!"),
            Err(MediaError::Invalid(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png;base64,"),
            Err(MediaError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = parse_data_uri("data:image/svg+xml;base64,PHN2Zz4=").unwrap_err();
        assert_eq!(err.to_string(), "unsupported image type: svg+xml");
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let payload = "A".repeat((MAX_IMAGE_BYTES / 3 + 8) * 4);
        let uri = format!("data:image/jpeg;base64,{payload}");
        assert!(matches!(parse_data_uri(&uri), Err(MediaError::TooLarge)));
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", Uuid::new_v4()));
        let storage = MediaStorage::new(root.clone());
        let image = parse_data_uri(PNG).unwrap();

        let relative = storage.save(MediaKind::Avatar, &image).await.unwrap();
        assert!(relative.starts_with("users/"));
        assert!(relative.ends_with(".png"));
        assert_eq!(tokio::fs::read(root.join(&relative)).await.unwrap(), image.bytes);

        storage.delete(&relative).await;
        assert!(!root.join(&relative).exists());

        // second delete is a no-op
        storage.delete(&relative).await;
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
