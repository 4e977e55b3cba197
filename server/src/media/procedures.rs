//! Media RPC procedures and the asset wire representation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pepper_common::LocalizedText;
use pepper_rbac::{Action, Resource};

use crate::db::{self, MediaAsset};
use crate::rpc::{Procedure, ProcedureContext, ProcedureRegistry, RpcError};

use super::error::MediaError;

/// Media failures inside procedures become RPC codes; the translatable
/// payload shape is reserved for the HTTP upload boundary.
impl From<MediaError> for RpcError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotFound => Self::NotFound("Media asset"),
            MediaError::DuplicateFile { filename } => {
                Self::Conflict(format!("Duplicate file: {filename}"))
            }
            MediaError::Validation(detail) => Self::Validation(detail),
            MediaError::Database(e) => Self::Database(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Tag reference embedded in media responses.
#[derive(Debug, Serialize)]
pub struct TagRef {
    pub id: Uuid,
    pub slug: String,
}

/// Wire representation of a media asset.
#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub blurhash: Option<String>,
    pub title: LocalizedText,
    pub alt_text: LocalizedText,
    pub caption: LocalizedText,
    pub category_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    /// Variant name → download URL. "original" is always present.
    pub variants: BTreeMap<&'static str, String>,
    pub tags: Vec<TagRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaResponse {
    /// Build the wire representation from a row and its tags.
    #[must_use]
    pub fn from_asset(asset: MediaAsset, tags: Vec<db::Tag>) -> Self {
        let mut variants = BTreeMap::new();
        variants.insert("original", format!("/api/media/{}/download", asset.id));
        for (name, key) in [
            ("thumbnail", &asset.thumbnail_key),
            ("medium", &asset.medium_key),
            ("large", &asset.large_key),
        ] {
            if key.is_some() {
                variants.insert(
                    name,
                    format!("/api/media/{}/download?variant={name}", asset.id),
                );
            }
        }

        Self {
            id: asset.id,
            filename: asset.filename,
            mime_type: asset.mime_type,
            size_bytes: asset.size_bytes,
            content_hash: asset.content_hash,
            width: asset.width,
            height: asset.height,
            blurhash: asset.blurhash,
            title: asset.title.0,
            alt_text: asset.alt_text.0,
            caption: asset.caption.0,
            category_id: asset.category_id,
            uploaded_by: asset.uploaded_by,
            variants,
            tags: tags
                .into_iter()
                .map(|t| TagRef {
                    id: t.id,
                    slug: t.slug,
                })
                .collect(),
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}

/// Input for `media.list`.
#[derive(Debug, Deserialize)]
pub struct ListMediaInput {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input for `media.get`.
#[derive(Debug, Deserialize)]
pub struct GetMediaInput {
    pub id: Uuid,
}

/// Input for `media.update`. Omitted fields stay unchanged; `category_id`
/// distinguishes "omitted" from an explicit `null` (detach).
#[derive(Debug, Deserialize)]
pub struct UpdateMediaInput {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub alt_text: Option<LocalizedText>,
    #[serde(default)]
    pub caption: Option<LocalizedText>,
    #[serde(default, deserialize_with = "crate::rpc::double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for `media.delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteMediaInput {
    pub id: Uuid,
}

/// Result of `media.delete`.
#[derive(Debug, Serialize)]
pub struct DeleteMediaResult {
    pub deleted: bool,
}

/// Register media procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("media.list")
            .authorized(Resource::Media, Action::View)
            .handler(list_media),
    );
    registry.register(
        Procedure::builder("media.get")
            .authorized(Resource::Media, Action::View)
            .handler(get_media),
    );
    registry.register(
        Procedure::builder("media.update")
            .authorized(Resource::Media, Action::Update)
            .handler(update_media),
    );
    registry.register(
        Procedure::builder("media.delete")
            .authorized(Resource::Media, Action::Delete)
            .handler(delete_media),
    );
}

async fn list_media(
    ctx: ProcedureContext,
    input: ListMediaInput,
) -> Result<Vec<MediaResponse>, RpcError> {
    let limit = input.limit.unwrap_or(50).clamp(1, 200);
    let offset = input.offset.unwrap_or(0).max(0);

    let assets = db::list_media(&ctx.state.db, limit, offset).await?;

    let mut responses = Vec::with_capacity(assets.len());
    for asset in assets {
        let tags = db::list_media_tags(&ctx.state.db, asset.id).await?;
        responses.push(MediaResponse::from_asset(asset, tags));
    }
    Ok(responses)
}

async fn get_media(ctx: ProcedureContext, input: GetMediaInput) -> Result<MediaResponse, RpcError> {
    let asset = db::find_media_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Media asset"))?;
    let tags = db::list_media_tags(&ctx.state.db, asset.id).await?;
    Ok(MediaResponse::from_asset(asset, tags))
}

async fn update_media(
    ctx: ProcedureContext,
    input: UpdateMediaInput,
) -> Result<MediaResponse, RpcError> {
    let actor = ctx.actor()?;

    let existing = db::find_media_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Media asset"))?;

    // Merge: omitted fields keep their stored value.
    let title = input.title.unwrap_or_else(|| existing.title.0.clone());
    let alt_text = input.alt_text.unwrap_or_else(|| existing.alt_text.0.clone());
    let caption = input.caption.unwrap_or_else(|| existing.caption.0.clone());
    let category_id = match input.category_id {
        Some(value) => value,
        None => existing.category_id,
    };

    if !title.values_non_blank() || !alt_text.values_non_blank() || !caption.values_non_blank() {
        return Err(RpcError::Validation(
            "Localized fields must not contain blank values".to_string(),
        ));
    }

    let updated =
        db::update_media_metadata(&ctx.state.db, input.id, &title, &alt_text, &caption, category_id)
            .await?
            .ok_or(RpcError::NotFound("Media asset"))?;

    if let Some(tag_ids) = &input.tag_ids {
        db::set_media_tags(&ctx.state.db, updated.id, tag_ids).await?;
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "media.update",
        Some("media"),
        Some(updated.id),
        None,
    )
    .await;

    let tags = db::list_media_tags(&ctx.state.db, updated.id).await?;
    Ok(MediaResponse::from_asset(updated, tags))
}

async fn delete_media(
    ctx: ProcedureContext,
    input: DeleteMediaInput,
) -> Result<DeleteMediaResult, RpcError> {
    let actor = ctx.actor()?;

    let asset = db::find_media_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Media asset"))?;

    // Row first; once it is gone the asset is unreachable even if storage
    // cleanup below partially fails.
    let deleted = db::delete_media(&ctx.state.db, asset.id).await?;
    if !deleted {
        return Err(RpcError::NotFound("Media asset"));
    }

    if let Some(storage) = &ctx.state.storage {
        let keys = [
            Some(asset.original_key.as_str()),
            asset.thumbnail_key.as_deref(),
            asset.medium_key.as_deref(),
            asset.large_key.as_deref(),
        ];
        for key in keys.into_iter().flatten() {
            if let Err(e) = storage.delete(key).await {
                tracing::error!(key = %key, error = %e, "Failed to delete variant object");
            }
        }
    } else {
        tracing::warn!(
            media_id = %asset.id,
            "Storage not configured; variant objects were not removed"
        );
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "media.delete",
        Some("media"),
        Some(asset.id),
        Some(&serde_json::json!({ "filename": asset.filename })),
    )
    .await;

    Ok(DeleteMediaResult { deleted: true })
}
