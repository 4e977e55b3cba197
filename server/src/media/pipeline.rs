//! Media Upload Pipeline
//!
//! Sequential, single-pass: sanitize → hash → duplicate check → variants →
//! storage writes → metadata insert. Any step failure aborts the whole
//! operation; objects already written to storage are removed before the
//! error surfaces, so there is no partial persistence.

use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use pepper_common::LocalizedText;

use crate::api::AppState;
use crate::db::{self, MediaAsset, NewMediaAsset};

use super::error::MediaError;
use super::processing::ImageProcessingResult;
use super::sanitize::sanitize_filename;
use super::storage::ObjectStorage;

/// Default allowed MIME types for media uploads.
const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    // Documents
    "application/pdf",
    "text/plain",
];

/// Parsed upload request, independent of the HTTP boundary.
#[derive(Debug)]
pub struct UploadInput {
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// Declared filename.
    pub filename: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    /// Localized title.
    pub title: LocalizedText,
    /// Localized alt text.
    pub alt_text: LocalizedText,
    /// Localized caption.
    pub caption: LocalizedText,
    /// Category to attach, if any.
    pub category_id: Option<Uuid>,
    /// Tags to attach.
    pub tag_ids: Vec<Uuid>,
}

/// Validate file content against its claimed MIME type using magic byte
/// detection.
///
/// Returns the verified MIME type (detected from content, or the claimed
/// type for formats where magic byte detection isn't possible like plain
/// text).
fn validate_file_content(data: &[u8], claimed_mime: &str) -> Result<String, MediaError> {
    // For text/plain: infer can't detect plain text via magic bytes.
    // Accept if the content is valid UTF-8 and contains no null bytes.
    if claimed_mime == "text/plain" {
        if std::str::from_utf8(data).is_ok() && !data.contains(&0) {
            return Ok(claimed_mime.to_string());
        }
        return Err(MediaError::InvalidMimeType {
            mime_type: "binary data claimed as text/plain".to_string(),
        });
    }

    // Use magic byte detection for all other types
    let detected = if let Some(kind) = infer::get(data) {
        kind.mime_type().to_string()
    } else {
        tracing::warn!(
            claimed_mime = %claimed_mime,
            size = data.len(),
            "File content does not match any known magic byte signature"
        );
        return Err(MediaError::InvalidMimeType {
            mime_type: format!("{claimed_mime} (content unrecognizable)"),
        });
    };

    if detected == claimed_mime || (claimed_mime == "image/jpg" && detected == "image/jpeg") {
        return Ok(detected);
    }

    tracing::warn!(
        claimed_mime = %claimed_mime,
        detected_mime = %detected,
        "File content type mismatch"
    );
    Err(MediaError::InvalidMimeType {
        mime_type: format!("{claimed_mime} (detected: {detected})"),
    })
}

/// Remove already-written objects after a failed step.
async fn cleanup_objects(storage: &ObjectStorage, keys: &[String]) {
    for key in keys {
        if let Err(e) = storage.delete(key).await {
            tracing::error!(key = %key, error = %e, "Failed to clean up orphaned object");
        }
    }
}

/// Map a metadata-insert failure onto the pipeline error taxonomy.
///
/// The unique index on `content_hash` is the authoritative duplicate check;
/// a race past the pre-check lands here.
fn map_insert_error(e: &sqlx::Error, filename: &str) -> MediaError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return MediaError::DuplicateFile {
                filename: filename.to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return MediaError::Validation("Unknown category or tag".to_string());
        }
    }
    tracing::error!(filename = %filename, error = %e, "Media metadata insert failed");
    MediaError::UploadFailed {
        filename: filename.to_string(),
    }
}

/// Upload a media asset: the whole pipeline from raw bytes to persisted row.
pub async fn upload_media(
    state: &AppState,
    input: UploadInput,
    actor_id: Uuid,
) -> Result<MediaAsset, MediaError> {
    let storage = state.storage.as_ref().ok_or(MediaError::NotConfigured)?;

    if input.data.len() > state.config.max_upload_size {
        return Err(MediaError::TooLarge {
            max_size: state.config.max_upload_size,
        });
    }

    if !input.title.values_non_blank()
        || !input.alt_text.values_non_blank()
        || !input.caption.values_non_blank()
    {
        return Err(MediaError::Validation(
            "Localized fields must not contain blank values".to_string(),
        ));
    }

    // Step 1: sanitize the filename.
    let safe_filename = sanitize_filename(&input.filename);

    // Determine and verify the content type.
    let content_type = input
        .content_type
        .clone()
        .or_else(|| {
            mime_guess::from_path(&input.filename)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let allowed_types: Vec<&str> = state.config.allowed_mime_types.as_ref().map_or_else(
        || DEFAULT_ALLOWED_TYPES.to_vec(),
        |v| v.iter().map(String::as_str).collect(),
    );

    if !allowed_types.contains(&content_type.as_str()) {
        return Err(MediaError::InvalidMimeType {
            mime_type: content_type,
        });
    }

    let content_type = validate_file_content(&input.data, &content_type)?;

    // Step 2: content hash and duplicate check. The pre-check gives a clean
    // error without burning storage writes; the unique index catches races.
    let content_hash = hex::encode(Sha256::digest(&input.data));

    if db::find_media_by_hash(&state.db, &content_hash)
        .await?
        .is_some()
    {
        return Err(MediaError::DuplicateFile {
            filename: safe_filename,
        });
    }

    // Step 3: derived variants for images. A processing failure aborts the
    // upload; a corrupt image should never be half-persisted.
    let processed: Option<ImageProcessingResult> = if content_type.starts_with("image/") {
        let data = input.data.clone();
        let mime = content_type.clone();
        let result = tokio::task::spawn_blocking(move || super::processing::process_image(&data, &mime))
            .await
            .map_err(|e| MediaError::Processing(format!("processing task failed: {e}")))?
            .map_err(|e| MediaError::Processing(e.to_string()))?;
        Some(result)
    } else {
        None
    };

    // Step 4a: write every variant to storage under the content hash.
    let extension = std::path::Path::new(&safe_filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let base_key = format!("media/{content_hash}");
    let original_key = format!("{base_key}/original.{extension}");

    let mut written: Vec<String> = Vec::new();

    if let Err(e) = storage
        .upload(&original_key, input.data.clone(), &content_type)
        .await
    {
        tracing::error!(key = %original_key, error = %e, "Original upload failed");
        return Err(MediaError::UploadFailed {
            filename: safe_filename,
        });
    }
    written.push(original_key.clone());

    let mut thumbnail_key = None;
    let mut medium_key = None;
    let mut large_key = None;

    if let Some(ref meta) = processed {
        let variants = [
            ("thumbnail", &meta.thumbnail, &mut thumbnail_key),
            ("medium", &meta.medium, &mut medium_key),
            ("large", &meta.large, &mut large_key),
        ];
        for (name, variant, key_slot) in variants {
            if let Some(variant) = variant {
                let key = format!("{base_key}/{name}.webp");
                if let Err(e) = storage
                    .upload(&key, variant.data.clone(), &variant.content_type)
                    .await
                {
                    tracing::error!(key = %key, error = %e, "Variant upload failed");
                    cleanup_objects(storage, &written).await;
                    return Err(MediaError::UploadFailed {
                        filename: safe_filename,
                    });
                }
                written.push(key.clone());
                *key_slot = Some(key);
            }
        }
    }

    // Step 4b: persist metadata and tag associations.
    let (width, height, blurhash) = processed.as_ref().map_or((None, None, None), |meta| {
        (
            Some(meta.width.min(i32::MAX as u32) as i32),
            Some(meta.height.min(i32::MAX as u32) as i32),
            Some(meta.blurhash.clone()),
        )
    });

    let new_asset = NewMediaAsset {
        filename: &safe_filename,
        mime_type: &content_type,
        size_bytes: input.data.len() as i64,
        content_hash: &content_hash,
        width,
        height,
        blurhash: blurhash.as_deref(),
        title: &input.title,
        alt_text: &input.alt_text,
        caption: &input.caption,
        category_id: input.category_id,
        uploaded_by: actor_id,
        original_key: &original_key,
        thumbnail_key: thumbnail_key.as_deref(),
        medium_key: medium_key.as_deref(),
        large_key: large_key.as_deref(),
    };

    let asset = match db::insert_media(&state.db, &new_asset, &input.tag_ids).await {
        Ok(asset) => asset,
        Err(e) => {
            let mapped = map_insert_error(&e, &safe_filename);
            cleanup_objects(storage, &written).await;
            return Err(mapped);
        }
    };

    crate::audit::record(
        &state.db,
        actor_id,
        "media.upload",
        Some("media"),
        Some(asset.id),
        Some(&serde_json::json!({
            "filename": asset.filename,
            "content_hash": asset.content_hash,
            "size_bytes": asset.size_bytes,
        })),
    )
    .await;

    info!(
        media_id = %asset.id,
        filename = %asset.filename,
        size = asset.size_bytes,
        variants = written.len(),
        "Media uploaded"
    );

    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_validation() {
        assert_eq!(
            validate_file_content(b"hello world", "text/plain").unwrap(),
            "text/plain"
        );
        assert!(validate_file_content(&[0u8, 159, 146, 150], "text/plain").is_err());
    }

    #[test]
    fn test_magic_byte_mismatch_rejected() {
        // PNG magic bytes claimed as JPEG.
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(validate_file_content(&png_header, "image/jpeg").is_err());
        assert_eq!(
            validate_file_content(&png_header, "image/png").unwrap(),
            "image/png"
        );
    }

    #[test]
    fn test_unrecognizable_content_rejected() {
        assert!(validate_file_content(b"no magic here", "image/png").is_err());
    }
}
