//! Product procedures.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use pepper_common::LocalizedText;
use pepper_rbac::{Action, Resource};

use crate::db::{self, NewProduct};
use crate::rpc::{validate_input, Procedure, ProcedureContext, ProcedureRegistry, RpcError};

use super::map_db_error;
use super::tags::{DeleteResult, TagResponse};

lazy_static! {
    static ref SKU_REGEX: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9-]{1,31}$").expect("static regex");
    static ref CURRENCY_REGEX: Regex = Regex::new(r"^[A-Z]{3}$").expect("static regex");
}

/// Wire representation of a product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub slug: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub price_cents: i64,
    pub currency: String,
    pub published: bool,
    pub category_id: Option<Uuid>,
    pub tags: Vec<TagResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    fn from_product(product: db::Product, tags: Vec<db::Tag>) -> Self {
        Self {
            id: product.id,
            sku: product.sku,
            slug: product.slug,
            name: product.name.0,
            description: product.description.0,
            price_cents: product.price_cents,
            currency: product.currency,
            published: product.published,
            category_id: product.category_id,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Input for `product.list`.
#[derive(Debug, Deserialize)]
pub struct ListProductsInput {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input for `product.get`.
#[derive(Debug, Deserialize)]
pub struct GetProductInput {
    pub id: Uuid,
}

/// Input for `product.create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(regex(path = *SKU_REGEX))]
    pub sku: String,
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(regex(path = *CURRENCY_REGEX))]
    pub currency: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Input for `product.update`. Omitted fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    pub id: Uuid,
    #[validate(regex(path = *SKU_REGEX))]
    pub sku: Option<String>,
    #[validate(regex(path = *super::SLUG_REGEX))]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<LocalizedText>,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    #[validate(regex(path = *CURRENCY_REGEX))]
    pub currency: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "crate::rpc::double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for `product.delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteProductInput {
    pub id: Uuid,
}

/// Register product procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("product.list")
            .authorized(Resource::Product, Action::View)
            .handler(list),
    );
    registry.register(
        Procedure::builder("product.get")
            .authorized(Resource::Product, Action::View)
            .handler(get),
    );
    registry.register(
        Procedure::builder("product.create")
            .authorized(Resource::Product, Action::Create)
            .handler(create),
    );
    registry.register(
        Procedure::builder("product.update")
            .authorized(Resource::Product, Action::Update)
            .handler(update),
    );
    registry.register(
        Procedure::builder("product.delete")
            .authorized(Resource::Product, Action::Delete)
            .handler(delete),
    );
}

fn require_name(name: &LocalizedText) -> Result<(), RpcError> {
    if name.is_empty() || !name.values_non_blank() {
        return Err(RpcError::Validation(
            "Product name requires at least one non-blank translation".to_string(),
        ));
    }
    Ok(())
}

async fn list(
    ctx: ProcedureContext,
    input: ListProductsInput,
) -> Result<Vec<ProductResponse>, RpcError> {
    let limit = input.limit.unwrap_or(50).clamp(1, 200);
    let offset = input.offset.unwrap_or(0).max(0);

    let products = db::list_products(&ctx.state.db, limit, offset).await?;

    let mut responses = Vec::with_capacity(products.len());
    for product in products {
        let tags = db::list_product_tags(&ctx.state.db, product.id).await?;
        responses.push(ProductResponse::from_product(product, tags));
    }
    Ok(responses)
}

async fn get(ctx: ProcedureContext, input: GetProductInput) -> Result<ProductResponse, RpcError> {
    let product = db::find_product_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Product"))?;
    let tags = db::list_product_tags(&ctx.state.db, product.id).await?;
    Ok(ProductResponse::from_product(product, tags))
}

async fn create(
    ctx: ProcedureContext,
    input: CreateProductInput,
) -> Result<ProductResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;
    require_name(&input.name)?;

    let new_product = NewProduct {
        sku: &input.sku,
        slug: &input.slug,
        name: &input.name,
        description: &input.description,
        price_cents: input.price_cents,
        currency: &input.currency,
        published: input.published,
        category_id: input.category_id,
    };

    let product = db::create_product(&ctx.state.db, &new_product)
        .await
        .map_err(|e| map_db_error(e, "Product"))?;

    if !input.tag_ids.is_empty() {
        db::set_product_tags(&ctx.state.db, product.id, &input.tag_ids)
            .await
            .map_err(|e| map_db_error(e, "Product"))?;
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "product.create",
        Some("product"),
        Some(product.id),
        Some(&serde_json::json!({ "sku": product.sku })),
    )
    .await;

    let tags = db::list_product_tags(&ctx.state.db, product.id).await?;
    Ok(ProductResponse::from_product(product, tags))
}

async fn update(
    ctx: ProcedureContext,
    input: UpdateProductInput,
) -> Result<ProductResponse, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    let existing = db::find_product_by_id(&ctx.state.db, input.id)
        .await?
        .ok_or(RpcError::NotFound("Product"))?;

    let sku = input.sku.unwrap_or_else(|| existing.sku.clone());
    let slug = input.slug.unwrap_or_else(|| existing.slug.clone());
    let name = input.name.unwrap_or_else(|| existing.name.0.clone());
    let description = input
        .description
        .unwrap_or_else(|| existing.description.0.clone());
    let price_cents = input.price_cents.unwrap_or(existing.price_cents);
    let currency = input.currency.unwrap_or_else(|| existing.currency.clone());
    let published = input.published.unwrap_or(existing.published);
    let category_id = match input.category_id {
        Some(value) => value,
        None => existing.category_id,
    };
    require_name(&name)?;

    let new_product = NewProduct {
        sku: &sku,
        slug: &slug,
        name: &name,
        description: &description,
        price_cents,
        currency: &currency,
        published,
        category_id,
    };

    let updated = db::update_product(&ctx.state.db, input.id, &new_product)
        .await
        .map_err(|e| map_db_error(e, "Product"))?
        .ok_or(RpcError::NotFound("Product"))?;

    if let Some(tag_ids) = &input.tag_ids {
        db::set_product_tags(&ctx.state.db, updated.id, tag_ids)
            .await
            .map_err(|e| map_db_error(e, "Product"))?;
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "product.update",
        Some("product"),
        Some(updated.id),
        Some(&serde_json::json!({ "sku": updated.sku })),
    )
    .await;

    let tags = db::list_product_tags(&ctx.state.db, updated.id).await?;
    Ok(ProductResponse::from_product(updated, tags))
}

async fn delete(
    ctx: ProcedureContext,
    input: DeleteProductInput,
) -> Result<DeleteResult, RpcError> {
    let actor = ctx.actor()?;

    let deleted = db::delete_product(&ctx.state.db, input.id).await?;
    if !deleted {
        return Err(RpcError::NotFound("Product"));
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "product.delete",
        Some("product"),
        Some(input.id),
        None,
    )
    .await;

    Ok(DeleteResult { deleted: true })
}
