use crate::blob_store::FsBlobStore;
use crate::config::{extension_for_media_type, UploadConfig, ALLOWED_MEDIA_TYPES};
use crate::error::ServiceError;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Upload ingestion service
///
/// Validates declared media type and size, mints a fresh identifier,
/// and persists the bytes. Deliberately not idempotent: every call
/// produces a new identifier and a new stored image, even for
/// byte-identical uploads.
pub struct UploadService {
    blob_store: Arc<FsBlobStore>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(blob_store: Arc<FsBlobStore>, config: UploadConfig) -> Self {
        Self { blob_store, config }
    }

    /// Validate and persist an uploaded image, returning its identifier
    #[instrument(skip(self, content), fields(size_bytes = content.len()))]
    pub async fn process_upload(
        &self,
        declared_media_type: &str,
        content: &[u8],
    ) -> Result<String, ServiceError> {
        let extension = validate_media_type(declared_media_type)?;
        validate_size(content.len(), self.config.max_upload_bytes)?;

        let image_id = generate_image_id();
        self.blob_store.save(&image_id, extension, content).await?;

        info!(
            image_id = %image_id,
            size_bytes = content.len(),
            media_type = %declared_media_type,
            "Image uploaded"
        );
        counter!("uploads_total").increment(1);

        Ok(image_id)
    }
}

/// Check the declared media type against the allow-list
///
/// Returns the storage extension for the type on success.
fn validate_media_type(media_type: &str) -> Result<&'static str, ServiceError> {
    let lowered = media_type.to_ascii_lowercase();
    if !ALLOWED_MEDIA_TYPES.contains(&lowered.as_str()) {
        return Err(ServiceError::InvalidMediaType {
            media_type: media_type.to_string(),
        });
    }
    extension_for_media_type(&lowered).ok_or_else(|| ServiceError::InvalidMediaType {
        media_type: media_type.to_string(),
    })
}

/// Check the upload size is within (0, max_bytes]
fn validate_size(size_bytes: usize, max_bytes: usize) -> Result<(), ServiceError> {
    if size_bytes == 0 || size_bytes > max_bytes {
        return Err(ServiceError::TooLarge { size_bytes });
    }
    Ok(())
}

/// Mint a fresh globally unique image identifier
fn generate_image_id() -> String {
    Uuid::new_v4().to_string()
}
