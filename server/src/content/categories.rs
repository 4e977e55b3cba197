//! Category procedures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use pepper_common::LocalizedText;
use pepper_rbac::{Action, Resource};

use crate::db;
use crate::rpc::{validate_input, Procedure, ProcedureContext, ProcedureRegistry, RpcError};

use super::map_db_error;
use super::tags::DeleteResult;

/// Wire representation of a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: LocalizedText,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<db::Category> for CategoryResponse {
    fn from(category: db::Category) -> Self {
        Self {
            id: category.id,
            slug: category.slug,
            name: category.name.0,
            parent_id: category.parent_id,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Input for `category.create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Input for `category.update`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    pub id: Uuid,
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<LocalizedText>,
    /// Omitted: unchanged. Explicit null: detach from the parent.
    #[serde(default, deserialize_with = "crate::rpc::double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

/// Input for `category.delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteCategoryInput {
    pub id: Uuid,
}

/// Register category procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("category.list")
            .authorized(Resource::Category, Action::View)
            .handler(list),
    );
    registry.register(
        Procedure::builder("category.create")
            .authorized(Resource::Category, Action::Create)
            .handler(create),
    );
    registry.register(
        Procedure::builder("category.update")
            .authorized(Resource::Category, Action::Update)
            .handler(update),
    );
    registry.register(
        Procedure::builder("category.delete")
            .authorized(Resource::Category, Action::Delete)
            .handler(delete),
    );
}

fn require_name(name: &LocalizedText) -> Result<(), RpcError> {
    if name.is_empty() || !name.values_non_blank() {
        return Err(RpcError::Validation(
            "Category name requires at least one non-blank translation".to_string(),
        ));
    }
    Ok(())
}

async fn list(
    ctx: ProcedureContext,
    _input: serde::de::IgnoredAny,
) -> Result<Vec<CategoryResponse>, RpcError> {
    let categories = db::list_categories(&ctx.state.db).await?;
    Ok(categories.into_iter().map(CategoryResponse::from).collect())
}

async fn create(
    ctx: ProcedureContext,
    input: CreateCategoryInput,
) -> Result<CategoryResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;
    require_name(&input.name)?;

    // Single-level hierarchy: a parent must itself be a root category.
    if let Some(parent_id) = input.parent_id {
        let parent = db::find_category_by_id(&ctx.state.db, parent_id)
            .await?
            .ok_or_else(|| RpcError::Validation("Unknown parent category".to_string()))?;
        if parent.parent_id.is_some() {
            return Err(RpcError::Validation(
                "Categories nest at most one level deep".to_string(),
            ));
        }
    }

    let category = db::create_category(&ctx.state.db, &input.slug, &input.name, input.parent_id)
        .await
        .map_err(|e| map_db_error(e, "Category"))?;

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "category.create",
        Some("category"),
        Some(category.id),
        None,
    )
    .await;

    Ok(CategoryResponse::from(category))
}

async fn update(
    ctx: ProcedureContext,
    input: UpdateCategoryInput,
) -> Result<CategoryResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    let existing = db::find_category_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Category"))?;

    let slug = input.slug.unwrap_or_else(|| existing.slug.clone());
    let name = input.name.unwrap_or_else(|| existing.name.0.clone());
    let parent_id = match input.parent_id {
        Some(value) => value,
        None => existing.parent_id,
    };
    require_name(&name)?;

    if parent_id == Some(input.id) {
        return Err(RpcError::Validation(
            "A category cannot be its own parent".to_string(),
        ));
    }
    if let Some(parent_id) = parent_id {
        let parent = db::find_category_by_id(&ctx.state.db, parent_id)
            .await?
            .ok_or_else(|| RpcError::Validation("Unknown parent category".to_string()))?;
        if parent.parent_id.is_some() {
            return Err(RpcError::Validation(
                "Categories nest at most one level deep".to_string(),
            ));
        }
    }

    let updated = db::update_category(&ctx.state.db, input.id, &slug, &name, parent_id)
        .await
        .map_err(|e| map_db_error(e, "Category"))?
        .ok_or(RpcError::NotFound("Category"))?;

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "category.update",
        Some("category"),
        Some(updated.id),
        None,
    )
    .await;

    Ok(CategoryResponse::from(updated))
}

async fn delete(
    ctx: ProcedureContext,
    input: DeleteCategoryInput,
) -> Result<DeleteResult, RpcError> {
    let actor = ctx.actor()?;

    if db::category_has_children(&ctx.state.db, input.id).await? {
        return Err(RpcError::Conflict(
            "Category still has child categories".to_string(),
        ));
    }

    let deleted = db::delete_category(&ctx.state.db, input.id).await?;
    if !deleted {
        return Err(RpcError::NotFound("Category"));
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "category.delete",
        Some("category"),
        Some(input.id),
        None,
    )
    .await;

    Ok(DeleteResult { deleted: true })
}
