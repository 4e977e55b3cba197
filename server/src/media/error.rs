//! Media Error Types
//!
//! Media failures serialize in the translatable shape
//! `{ "error": "error.<key>", "context": { ... } }` so clients can localize
//! them. Internal detail (storage/database messages) is logged server-side
//! and never leaks into the payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur during media operations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Media storage is not configured.
    #[error("Media storage is not configured")]
    NotConfigured,

    /// No file provided in the multipart body.
    #[error("No file provided")]
    NoFile,

    /// File too large.
    #[error("File too large (max: {max_size} bytes)")]
    TooLarge {
        /// Maximum allowed size in bytes.
        max_size: usize,
    },

    /// Rejected MIME type.
    #[error("Invalid file type: {mime_type}")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// Filename unusable even after sanitization.
    #[error("Invalid filename")]
    InvalidFilename,

    /// A file with identical content already exists.
    #[error("Duplicate file: {filename}")]
    DuplicateFile {
        /// Sanitized filename of the rejected upload.
        filename: String,
    },

    /// Media asset not found.
    #[error("Media asset not found")]
    NotFound,

    /// Input validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image decoding/resizing failure.
    #[error("Image processing failed: {0}")]
    Processing(String),

    /// Catch-all upload failure after internal detail has been logged.
    #[error("Upload failed: {filename}")]
    UploadFailed {
        /// Sanitized filename of the failed upload.
        filename: String,
    },

    /// Storage error outside the upload pipeline.
    #[error("Storage error")]
    Storage(String),

    /// Database error outside the upload pipeline.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl MediaError {
    /// Translatable message key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::NotConfigured => "error.media.storage-unavailable",
            Self::NoFile => "error.media.missing-file",
            Self::TooLarge { .. } => "error.media.too-large",
            Self::InvalidMimeType { .. } => "error.media.invalid-type",
            Self::InvalidFilename => "error.media.invalid-filename",
            Self::DuplicateFile { .. } => "error.media.duplicate-file",
            Self::NotFound => "error.media.not-found",
            Self::Validation(_) => "error.media.validation",
            Self::Processing(_) => "error.media.processing-failed",
            Self::UploadFailed { .. } => "error.media.upload-failed",
            Self::Storage(_) => "error.media.storage-failed",
            Self::Database(_) => "error.media.internal",
        }
    }

    /// Localization parameters for the client.
    fn context(&self) -> serde_json::Value {
        match self {
            Self::TooLarge { max_size } => json!({ "max_size": max_size }),
            Self::InvalidMimeType { mime_type } => json!({ "mime_type": mime_type }),
            Self::DuplicateFile { filename } | Self::UploadFailed { filename } => {
                json!({ "filename": filename })
            }
            Self::Validation(detail) | Self::Processing(detail) => json!({ "detail": detail }),
            _ => json!({}),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::NoFile
            | Self::InvalidFilename
            | Self::DuplicateFile { .. }
            | Self::Validation(_)
            | Self::Processing(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UploadFailed { .. } | Self::Storage(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        if let Self::Storage(ref detail) = self {
            tracing::error!(detail = %detail, "Media storage error");
        }
        if let Self::Database(ref e) = self {
            tracing::error!(error = %e, "Media database error");
        }

        let body = Json(json!({
            "error": self.key(),
            "context": self.context(),
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_payload_shape() {
        let err = MediaError::DuplicateFile {
            filename: "my-file.jpg".to_string(),
        };
        assert_eq!(err.key(), "error.media.duplicate-file");
        assert_eq!(err.context(), json!({ "filename": "my-file.jpg" }));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upload_failed_is_500_with_filename_context() {
        let err = MediaError::UploadFailed {
            filename: "shot.png".to_string(),
        };
        assert_eq!(err.key(), "error.media.upload-failed");
        assert_eq!(err.context(), json!({ "filename": "shot.png" }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_detail_not_in_context() {
        let err = MediaError::Storage("bucket credentials leaked".to_string());
        assert_eq!(err.context(), json!({}));
    }
}
