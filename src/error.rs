use thiserror::Error;

/// Domain errors for the image analysis service
///
/// Each variant maps 1:1 to an HTTP status code at the API boundary;
/// the mapping itself lives in the `api` module.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Declared media type is outside the allow-list
    #[error("invalid media type: {media_type}")]
    InvalidMediaType { media_type: String },

    /// Upload is empty or exceeds the configured size ceiling
    #[error("upload size {size_bytes} bytes is outside the allowed range")]
    TooLarge { size_bytes: usize },

    /// No stored image and no cached analysis result for this identifier
    #[error("image with ID {image_id} not found")]
    NotFound { image_id: String },

    /// I/O failure reading or writing durable state
    #[error("storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Catch-all for failures with no dedicated variant
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ServiceError {
    /// Short error category used in HTTP error bodies
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::InvalidMediaType { .. } => "Invalid file type",
            ServiceError::TooLarge { .. } => "File too large",
            ServiceError::NotFound { .. } => "Image not found",
            ServiceError::Storage { .. } => "Storage error",
            ServiceError::Unexpected(_) => "Internal server error",
        }
    }

    /// Whether the client caused this error (4xx) or the server did (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidMediaType { .. }
                | ServiceError::TooLarge { .. }
                | ServiceError::NotFound { .. }
        )
    }

    pub(crate) fn storage(operation: &'static str, source: std::io::Error) -> Self {
        ServiceError::Storage { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = ServiceError::InvalidMediaType {
            media_type: "text/plain".to_string(),
        };
        assert_eq!(err.category(), "Invalid file type");
        assert!(err.is_client_error());

        let err = ServiceError::storage(
            "write analysis result",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.category(), "Storage error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ServiceError::NotFound {
            image_id: "abc-123".to_string(),
        };
        assert!(err.to_string().contains("abc-123"));
    }
}
