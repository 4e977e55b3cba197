//! Tag procedures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use pepper_common::LocalizedText;
use pepper_rbac::{Action, Resource};

use crate::db;
use crate::rpc::{validate_input, Procedure, ProcedureContext, ProcedureRegistry, RpcError};

use super::map_db_error;

/// Wire representation of a tag, shared with post/product/media responses.
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub slug: String,
    pub label: LocalizedText,
}

impl From<db::Tag> for TagResponse {
    fn from(tag: db::Tag) -> Self {
        Self {
            id: tag.id,
            slug: tag.slug,
            label: tag.label.0,
        }
    }
}

/// Input for `tag.create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagInput {
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: String,
    pub label: LocalizedText,
}

/// Input for `tag.update`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagInput {
    pub id: Uuid,
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: Option<String>,
    #[serde(default)]
    pub label: Option<LocalizedText>,
}

/// Input for `tag.delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteTagInput {
    pub id: Uuid,
}

/// Result of delete procedures.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// Register tag procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("tag.list")
            .authorized(Resource::Tag, Action::View)
            .handler(list),
    );
    registry.register(
        Procedure::builder("tag.create")
            .authorized(Resource::Tag, Action::Create)
            .handler(create),
    );
    registry.register(
        Procedure::builder("tag.update")
            .authorized(Resource::Tag, Action::Update)
            .handler(update),
    );
    registry.register(
        Procedure::builder("tag.delete")
            .authorized(Resource::Tag, Action::Delete)
            .handler(delete),
    );
}

async fn list(
    ctx: ProcedureContext,
    _input: serde::de::IgnoredAny,
) -> Result<Vec<TagResponse>, RpcError> {
    let tags = db::list_tags(&ctx.state.db).await?;
    Ok(tags.into_iter().map(TagResponse::from).collect())
}

async fn create(ctx: ProcedureContext, input: CreateTagInput) -> Result<TagResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    if input.label.is_empty() || !input.label.values_non_blank() {
        return Err(RpcError::Validation(
            "Tag label requires at least one non-blank translation".to_string(),
        ));
    }

    let tag = db::create_tag(&ctx.state.db, &input.slug, &input.label)
        .await
        .map_err(|e| map_db_error(e, "Tag"))?;

    crate::audit::record(&ctx.state.db, actor.id, "tag.create", Some("tag"), Some(tag.id), None)
        .await;

    Ok(TagResponse::from(tag))
}

async fn update(ctx: ProcedureContext, input: UpdateTagInput) -> Result<TagResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    let existing = db::find_tag_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Tag"))?;

    let slug = input.slug.unwrap_or_else(|| existing.slug.clone());
    let label = input.label.unwrap_or_else(|| existing.label.0.clone());

    if label.is_empty() || !label.values_non_blank() {
        return Err(RpcError::Validation(
            "Tag label requires at least one non-blank translation".to_string(),
        ));
    }

    let updated = db::update_tag(&ctx.state.db, input.id, &slug, &label)
        .await
        .map_err(|e| map_db_error(e, "Tag"))?
        .ok_or(RpcError::NotFound("Tag"))?;

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "tag.update",
        Some("tag"),
        Some(updated.id),
        None,
    )
    .await;

    Ok(TagResponse::from(updated))
}

async fn delete(ctx: ProcedureContext, input: DeleteTagInput) -> Result<DeleteResult, RpcError> {
    let actor = ctx.actor()?;

    let deleted = db::delete_tag(&ctx.state.db, input.id).await?;
    if !deleted {
        return Err(RpcError::NotFound("Tag"));
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "tag.delete",
        Some("tag"),
        Some(input.id),
        None,
    )
    .await;

    Ok(DeleteResult { deleted: true })
}
