//! Post procedures.
//!
//! Post bodies are Markdown per locale; `post.get` additionally returns the
//! rendered HTML.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use pepper_common::LocalizedText;
use pepper_rbac::{Action, Resource};

use crate::db::{self, NewPost};
use crate::rpc::{validate_input, Procedure, ProcedureContext, ProcedureRegistry, RpcError};

use super::tags::{DeleteResult, TagResponse};
use super::{map_db_error, render_markdown};

/// Wire representation of a post.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: LocalizedText,
    pub excerpt: LocalizedText,
    /// Markdown source, per locale.
    pub body: LocalizedText,
    /// Rendered HTML, per locale. Only populated by `post.get`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<LocalizedText>,
    pub published: bool,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub tags: Vec<TagResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    fn from_post(post: db::Post, tags: Vec<db::Tag>, with_html: bool) -> Self {
        let body = post.body.0;
        let body_html = with_html.then(|| {
            body.iter()
                .map(|(locale, source)| (locale.clone(), render_markdown(source)))
                .collect()
        });

        Self {
            id: post.id,
            slug: post.slug,
            title: post.title.0,
            excerpt: post.excerpt.0,
            body,
            body_html,
            published: post.published,
            author_id: post.author_id,
            category_id: post.category_id,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Input for `post.list`.
#[derive(Debug, Deserialize)]
pub struct ListPostsInput {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input for `post.get`.
#[derive(Debug, Deserialize)]
pub struct GetPostInput {
    pub id: Uuid,
}

/// Input for `post.create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: String,
    pub title: LocalizedText,
    #[serde(default)]
    pub excerpt: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Input for `post.update`. Omitted fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostInput {
    pub id: Uuid,
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<LocalizedText>,
    #[serde(default)]
    pub excerpt: Option<LocalizedText>,
    #[serde(default)]
    pub body: Option<LocalizedText>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "crate::rpc::double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for `post.delete`.
#[derive(Debug, Deserialize)]
pub struct DeletePostInput {
    pub id: Uuid,
}

/// Register post procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("post.list")
            .authorized(Resource::Post, Action::View)
            .handler(list),
    );
    registry.register(
        Procedure::builder("post.get")
            .authorized(Resource::Post, Action::View)
            .handler(get),
    );
    registry.register(
        Procedure::builder("post.create")
            .authorized(Resource::Post, Action::Create)
            .handler(create),
    );
    registry.register(
        Procedure::builder("post.update")
            .authorized(Resource::Post, Action::Update)
            .handler(update),
    );
    registry.register(
        Procedure::builder("post.delete")
            .authorized(Resource::Post, Action::Delete)
            .handler(delete),
    );
}

fn require_title(title: &LocalizedText) -> Result<(), RpcError> {
    if title.is_empty() || !title.values_non_blank() {
        return Err(RpcError::Validation(
            "Post title requires at least one non-blank translation".to_string(),
        ));
    }
    Ok(())
}

async fn list(ctx: ProcedureContext, input: ListPostsInput) -> Result<Vec<PostResponse>, RpcError> {
    let limit = input.limit.unwrap_or(50).clamp(1, 200);
    let offset = input.offset.unwrap_or(0).max(0);

    let posts = db::list_posts(&ctx.state.db, limit, offset).await?;

    let mut responses = Vec::with_capacity(posts.len());
    for post in posts {
        let tags = db::list_post_tags(&ctx.state.db, post.id).await?;
        responses.push(PostResponse::from_post(post, tags, false));
    }
    Ok(responses)
}

async fn get(ctx: ProcedureContext, input: GetPostInput) -> Result<PostResponse, RpcError> {
    let post = db::find_post_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Post"))?;
    let tags = db::list_post_tags(&ctx.state.db, post.id).await?;
    Ok(PostResponse::from_post(post, tags, true))
}

async fn create(ctx: ProcedureContext, input: CreatePostInput) -> Result<PostResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;
    require_title(&input.title)?;

    let new_post = NewPost {
        slug: &input.slug,
        title: &input.title,
        excerpt: &input.excerpt,
        body: &input.body,
        published: input.published,
        author_id: actor.id,
        category_id: input.category_id,
    };

    let post = db::create_post(&ctx.state.db, &new_post)
        .await
        .map_err(|e| map_db_error(e, "Post"))?;

    if !input.tag_ids.is_empty() {
        db::set_post_tags(&ctx.state.db, post.id, &input.tag_ids)
            .await
            .map_err(|e| map_db_error(e, "Post"))?;
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "post.create",
        Some("post"),
        Some(post.id),
        Some(&serde_json::json!({ "slug": post.slug })),
    )
    .await;

    let tags = db::list_post_tags(&ctx.state.db, post.id).await?;
    Ok(PostResponse::from_post(post, tags, false))
}

async fn update(ctx: ProcedureContext, input: UpdatePostInput) -> Result<PostResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    let existing = db::find_post_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Post"))?;

    let slug = input.slug.unwrap_or_else(|| existing.slug.clone());
    let title = input.title.unwrap_or_else(|| existing.title.0.clone());
    let excerpt = input.excerpt.unwrap_or_else(|| existing.excerpt.0.clone());
    let body = input.body.unwrap_or_else(|| existing.body.0.clone());
    let published = input.published.unwrap_or(existing.published);
    let category_id = match input.category_id {
        Some(value) => value,
        None => existing.category_id,
    };
    require_title(&title)?;

    let new_post = NewPost {
        slug: &slug,
        title: &title,
        excerpt: &excerpt,
        body: &body,
        published,
        author_id: existing.author_id,
        category_id,
    };

    let updated = db::update_post(&ctx.state.db, input.id, &new_post)
        .await
        .map_err(|e| map_db_error(e, "Post"))?
        .ok_or(RpcError::NotFound("Post"))?;

    if let Some(tag_ids) = &input.tag_ids {
        db::set_post_tags(&ctx.state.db, updated.id, tag_ids)
            .await
            .map_err(|e| map_db_error(e, "Post"))?;
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "post.update",
        Some("post"),
        Some(updated.id),
        Some(&serde_json::json!({ "slug": updated.slug })),
    )
    .await;

    let tags = db::list_post_tags(&ctx.state.db, updated.id).await?;
    Ok(PostResponse::from_post(updated, tags, false))
}

async fn delete(ctx: ProcedureContext, input: DeletePostInput) -> Result<DeleteResult, RpcError> {
    let actor = ctx.actor()?;

    let deleted = db::delete_post(&ctx.state.db, input.id).await?;
    if !deleted {
        return Err(RpcError::NotFound("Post"));
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "post.delete",
        Some("post"),
        Some(input.id),
        None,
    )
    .await;

    Ok(DeleteResult { deleted: true })
}
