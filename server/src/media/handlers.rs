//! Media HTTP Handlers
//!
//! The multipart upload boundary and variant download streaming. Both routes
//! sit behind `require_auth` plus the matching `require_permission` layer,
//! so unauthenticated or unauthorized requests never reach these functions.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use pepper_common::LocalizedText;

use crate::api::AppState;
use crate::auth::CurrentUser;
use crate::db;

use super::error::MediaError;
use super::pipeline::{upload_media, UploadInput};
use super::procedures::MediaResponse;

/// Query parameters for the download endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Variant to download: "original" (default), "thumbnail", "medium" or
    /// "large".
    pub variant: Option<String>,
}

/// Parse a JSON-encoded localized text field.
fn parse_localized(field_name: &str, raw: &str) -> Result<LocalizedText, MediaError> {
    serde_json::from_str(raw)
        .map_err(|e| MediaError::Validation(format!("Invalid {field_name}: {e}")))
}

/// Upload a media asset.
///
/// POST /api/media
///
/// Expects multipart form with:
/// - `file`: The file data (required)
/// - `title`, `alt_text`, `caption`: JSON-encoded localized strings
/// - `category_id`: UUID string
/// - `tag_ids`: comma-separated UUIDs
#[utoipa::path(
    post,
    path = "/api/media",
    tag = "media",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created media asset"),
        (status = 400, description = "Missing file or validation failure"),
        (status = 403, description = "Insufficient permissions"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, user, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaResponse>), MediaError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut title = LocalizedText::new();
    let mut alt_text = LocalizedText::new();
    let mut caption = LocalizedText::new();
    let mut category_id: Option<Uuid> = None;
    let mut tag_ids: Vec<Uuid> = Vec::new();

    // Parse multipart form
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                filename = field.file_name().map(String::from);
                content_type = field.content_type().map(String::from);

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| MediaError::Validation(e.to_string()))?;

                if data.len() > state.config.max_upload_size {
                    return Err(MediaError::TooLarge {
                        max_size: state.config.max_upload_size,
                    });
                }

                file_data = Some(data.to_vec());
            }
            "title" | "alt_text" | "caption" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| MediaError::Validation(e.to_string()))?;
                let parsed = parse_localized(&field_name, &text)?;
                match field_name.as_str() {
                    "title" => title = parsed,
                    "alt_text" => alt_text = parsed,
                    _ => caption = parsed,
                }
            }
            "category_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| MediaError::Validation(e.to_string()))?;
                category_id = Some(
                    text.parse()
                        .map_err(|_| MediaError::Validation("Invalid category_id".to_string()))?,
                );
            }
            "tag_ids" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| MediaError::Validation(e.to_string()))?;
                for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    tag_ids.push(
                        part.parse()
                            .map_err(|_| MediaError::Validation("Invalid tag_ids".to_string()))?,
                    );
                }
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let file_data = file_data.ok_or(MediaError::NoFile)?;
    let filename = filename.ok_or(MediaError::InvalidFilename)?;

    let input = UploadInput {
        data: file_data,
        filename,
        content_type,
        title,
        alt_text,
        caption,
        category_id,
        tag_ids,
    };

    let asset = upload_media(&state, input, user.id).await?;
    let tags = db::list_media_tags(&state.db, asset.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(MediaResponse::from_asset(asset, tags)),
    ))
}

/// Download a media variant (streamed from object storage).
///
/// GET /api/media/{id}/download?variant=thumbnail
///
/// Unknown variant names are a validation error; a variant the asset does
/// not have falls back to the original.
#[utoipa::path(
    get,
    path = "/api/media/{id}/download",
    tag = "media",
    params(("id" = Uuid, Path, description = "Media asset ID")),
    responses(
        (status = 200, description = "Variant bytes"),
        (status = 404, description = "Unknown media asset"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, MediaError> {
    let storage = state.storage.as_ref().ok_or(MediaError::NotConfigured)?;

    let asset = db::find_media_by_id(&state.db, id)
        .await?
        .ok_or(MediaError::NotFound)?;

    // Resolve the storage key and served content type for the variant.
    let (key, content_type) = match query.variant.as_deref() {
        None | Some("original") => (asset.original_key.clone(), asset.mime_type.clone()),
        Some("thumbnail") => variant_or_original(&asset, asset.thumbnail_key.as_deref()),
        Some("medium") => variant_or_original(&asset, asset.medium_key.as_deref()),
        Some("large") => variant_or_original(&asset, asset.large_key.as_deref()),
        Some(invalid) => {
            return Err(MediaError::Validation(format!(
                "Invalid variant '{invalid}'. Supported values are 'original', 'thumbnail', 'medium' and 'large'"
            )));
        }
    };

    let stream = storage
        .get_object_stream(&key)
        .await
        .map_err(|e| MediaError::Storage(e.to_string()))?;

    // ByteStream converts directly to an Axum body via its inner SdkBody.
    let body = axum::body::Body::new(stream.into_inner());

    // Adjust the filename extension when serving a WebP variant.
    let display_filename = if content_type == "image/webp" && asset.mime_type != "image/webp" {
        let stem = asset
            .filename
            .rsplit_once('.')
            .map_or(asset.filename.as_str(), |(stem, _)| stem);
        format!("{stem}.webp")
    } else {
        asset.filename.clone()
    };

    let disposition = if content_type.starts_with("image/") {
        "inline"
    } else {
        "attachment"
    };
    let headers = [
        (header::CONTENT_TYPE, content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("{disposition}; filename=\"{display_filename}\""),
        ),
        (
            header::CACHE_CONTROL,
            "private, max-age=31536000, immutable".to_string(),
        ),
        (
            HeaderName::from_static("x-content-type-options"),
            "nosniff".to_string(),
        ),
    ];

    Ok((headers, body).into_response())
}

/// A variant's key and content type, falling back to the original when the
/// asset never had that variant generated.
fn variant_or_original(asset: &db::MediaAsset, key: Option<&str>) -> (String, String) {
    key.map_or_else(
        || (asset.original_key.clone(), asset.mime_type.clone()),
        |k| (k.to_string(), "image/webp".to_string()),
    )
}
