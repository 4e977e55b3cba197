//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use pepper_common::LocalizedText;

use super::models::{
    AuditLogEntry, Category, Language, MediaAsset, NewMediaAsset, NewPost, NewProduct, Post,
    Product, RolePermission, Tag, User,
};

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated, making production debugging easier.
macro_rules! db_error {
    ($query:expr) => {
        |e| {
            error!(query = $query, error = %e, "Database query failed");
            e
        }
    };
    ($query:expr, $($field:tt)+) => {
        |e| {
            error!(query = $query, $($field)+, error = %e, "Database query failed");
            e
        }
    };
}

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Find user by username.
pub async fn find_user_by_username(pool: &PgPool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_username", username = %username))
}

/// List all users, newest first.
pub async fn list_users(pool: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_users"))
}

/// Create a new user.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    display_name: &str,
    email: Option<&str>,
    password_hash: &str,
    role: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (username, display_name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(username)
    .bind(display_name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_user", username = %username))
}

/// Change a user's role. Returns the updated row if the user exists.
pub async fn update_user_role(
    pool: &PgPool,
    user_id: Uuid,
    role: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(role)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_user_role", user_id = %user_id, role = %role))
}

// ============================================================================
// Permission Queries
// ============================================================================

/// Load the denormalized permission rows for a role.
pub async fn list_role_permissions(pool: &PgPool, role: &str) -> sqlx::Result<Vec<RolePermission>> {
    sqlx::query_as::<_, RolePermission>(
        "SELECT role, resource, action, allowed FROM role_permissions WHERE role = $1",
    )
    .bind(role)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_role_permissions", role = %role))
}

// ============================================================================
// Language Queries
// ============================================================================

/// List configured languages.
pub async fn list_languages(pool: &PgPool) -> sqlx::Result<Vec<Language>> {
    sqlx::query_as::<_, Language>("SELECT * FROM languages ORDER BY code")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_languages"))
}

/// Find one language by its locale code.
pub async fn find_language(pool: &PgPool, code: &str) -> sqlx::Result<Option<Language>> {
    sqlx::query_as::<_, Language>("SELECT * FROM languages WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_language", code = %code))
}

/// Create a language.
pub async fn create_language(
    pool: &PgPool,
    code: &str,
    name: &str,
    native_name: &str,
    enabled: bool,
) -> sqlx::Result<Language> {
    sqlx::query_as::<_, Language>(
        r"
        INSERT INTO languages (code, name, native_name, enabled)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        ",
    )
    .bind(code)
    .bind(name)
    .bind(native_name)
    .bind(enabled)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_language", code = %code))
}

/// Update a language. Returns the updated row if it exists.
pub async fn update_language(
    pool: &PgPool,
    code: &str,
    name: &str,
    native_name: &str,
    enabled: bool,
) -> sqlx::Result<Option<Language>> {
    sqlx::query_as::<_, Language>(
        r"
        UPDATE languages SET name = $2, native_name = $3, enabled = $4
        WHERE code = $1
        RETURNING *
        ",
    )
    .bind(code)
    .bind(name)
    .bind(native_name)
    .bind(enabled)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_language", code = %code))
}

/// Delete a language by code. Returns whether a row was removed.
pub async fn delete_language(pool: &PgPool, code: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM languages WHERE code = $1")
        .bind(code)
        .execute(pool)
        .await
        .map_err(db_error!("delete_language", code = %code))?;
    Ok(result.rows_affected() > 0)
}

/// Count languages currently enabled.
pub async fn count_enabled_languages(pool: &PgPool) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM languages WHERE enabled")
        .fetch_one(pool)
        .await
        .map_err(db_error!("count_enabled_languages"))?;
    Ok(row.0)
}

// ============================================================================
// Category Queries
// ============================================================================

/// List all categories.
pub async fn list_categories(pool: &PgPool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY slug")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_categories"))
}

/// Find category by ID.
pub async fn find_category_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_category_by_id", category_id = %id))
}

/// Create a category.
pub async fn create_category(
    pool: &PgPool,
    slug: &str,
    name: &LocalizedText,
    parent_id: Option<Uuid>,
) -> sqlx::Result<Category> {
    sqlx::query_as::<_, Category>(
        r"
        INSERT INTO categories (slug, name, parent_id)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(slug)
    .bind(Json(name))
    .bind(parent_id)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_category", slug = %slug))
}

/// Update a category. Returns the updated row if it exists.
pub async fn update_category(
    pool: &PgPool,
    id: Uuid,
    slug: &str,
    name: &LocalizedText,
    parent_id: Option<Uuid>,
) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
        r"
        UPDATE categories SET slug = $2, name = $3, parent_id = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(slug)
    .bind(Json(name))
    .bind(parent_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_category", category_id = %id))
}

/// Delete a category. Returns whether a row was removed.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_category", category_id = %id))?;
    Ok(result.rows_affected() > 0)
}

/// Whether a category has child categories.
pub async fn category_has_children(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE parent_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(db_error!("category_has_children", category_id = %id))?;
    Ok(row.0)
}

// ============================================================================
// Tag Queries
// ============================================================================

/// List all tags.
pub async fn list_tags(pool: &PgPool) -> sqlx::Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY slug")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_tags"))
}

/// Find tag by ID.
pub async fn find_tag_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Tag>> {
    sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_tag_by_id", tag_id = %id))
}

/// Create a tag.
pub async fn create_tag(pool: &PgPool, slug: &str, label: &LocalizedText) -> sqlx::Result<Tag> {
    sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (slug, label) VALUES ($1, $2) RETURNING *",
    )
    .bind(slug)
    .bind(Json(label))
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_tag", slug = %slug))
}

/// Update a tag. Returns the updated row if it exists.
pub async fn update_tag(
    pool: &PgPool,
    id: Uuid,
    slug: &str,
    label: &LocalizedText,
) -> sqlx::Result<Option<Tag>> {
    sqlx::query_as::<_, Tag>(
        "UPDATE tags SET slug = $2, label = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(slug)
    .bind(Json(label))
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_tag", tag_id = %id))
}

/// Delete a tag. Returns whether a row was removed.
pub async fn delete_tag(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_tag", tag_id = %id))?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Post Queries
// ============================================================================

/// List posts, newest first.
pub async fn list_posts(pool: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<Post>> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_posts"))
}

/// Find post by ID.
pub async fn find_post_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_post_by_id", post_id = %id))
}

/// Create a post.
pub async fn create_post(pool: &PgPool, post: &NewPost<'_>) -> sqlx::Result<Post> {
    sqlx::query_as::<_, Post>(
        r"
        INSERT INTO posts (slug, title, excerpt, body, published, author_id, category_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        ",
    )
    .bind(post.slug)
    .bind(Json(post.title))
    .bind(Json(post.excerpt))
    .bind(Json(post.body))
    .bind(post.published)
    .bind(post.author_id)
    .bind(post.category_id)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_post", slug = %post.slug))
}

/// Update a post with full replacement values. Returns the updated row if it
/// exists.
pub async fn update_post(pool: &PgPool, id: Uuid, post: &NewPost<'_>) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(
        r"
        UPDATE posts
        SET slug = $2, title = $3, excerpt = $4, body = $5, published = $6,
            category_id = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(post.slug)
    .bind(Json(post.title))
    .bind(Json(post.excerpt))
    .bind(Json(post.body))
    .bind(post.published)
    .bind(post.category_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_post", post_id = %id))
}

/// Delete a post. Returns whether a row was removed.
pub async fn delete_post(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_post", post_id = %id))?;
    Ok(result.rows_affected() > 0)
}

/// Replace the tag set of a post.
pub async fn set_post_tags(pool: &PgPool, post_id: Uuid, tag_ids: &[Uuid]) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("set_post_tags", post_id = %post_id))?;
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("set_post_tags", post_id = %post_id, tag_id = %tag_id))?;
    }
    tx.commit().await
}

/// Tags attached to a post.
pub async fn list_post_tags(pool: &PgPool, post_id: Uuid) -> sqlx::Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>(
        r"
        SELECT t.* FROM tags t
        JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = $1
        ORDER BY t.slug
        ",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_post_tags", post_id = %post_id))
}

// ============================================================================
// Product Queries
// ============================================================================

/// List products, newest first.
pub async fn list_products(pool: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_products"))
}

/// Find product by ID.
pub async fn find_product_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_product_by_id", product_id = %id))
}

/// Create a product.
pub async fn create_product(pool: &PgPool, product: &NewProduct<'_>) -> sqlx::Result<Product> {
    sqlx::query_as::<_, Product>(
        r"
        INSERT INTO products (sku, slug, name, description, price_cents, currency, published, category_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        ",
    )
    .bind(product.sku)
    .bind(product.slug)
    .bind(Json(product.name))
    .bind(Json(product.description))
    .bind(product.price_cents)
    .bind(product.currency)
    .bind(product.published)
    .bind(product.category_id)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_product", sku = %product.sku))
}

/// Update a product with full replacement values. Returns the updated row if
/// it exists.
pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    product: &NewProduct<'_>,
) -> sqlx::Result<Option<Product>> {
    sqlx::query_as::<_, Product>(
        r"
        UPDATE products
        SET sku = $2, slug = $3, name = $4, description = $5, price_cents = $6,
            currency = $7, published = $8, category_id = $9, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(product.sku)
    .bind(product.slug)
    .bind(Json(product.name))
    .bind(Json(product.description))
    .bind(product.price_cents)
    .bind(product.currency)
    .bind(product.published)
    .bind(product.category_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_product", product_id = %id))
}

/// Delete a product. Returns whether a row was removed.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_product", product_id = %id))?;
    Ok(result.rows_affected() > 0)
}

/// Replace the tag set of a product.
pub async fn set_product_tags(
    pool: &PgPool,
    product_id: Uuid,
    tag_ids: &[Uuid],
) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM product_tags WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("set_product_tags", product_id = %product_id))?;
    for tag_id in tag_ids {
        sqlx::query(
            "INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("set_product_tags", product_id = %product_id, tag_id = %tag_id))?;
    }
    tx.commit().await
}

/// Tags attached to a product.
pub async fn list_product_tags(pool: &PgPool, product_id: Uuid) -> sqlx::Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>(
        r"
        SELECT t.* FROM tags t
        JOIN product_tags pt ON pt.tag_id = t.id
        WHERE pt.product_id = $1
        ORDER BY t.slug
        ",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_product_tags", product_id = %product_id))
}

// ============================================================================
// Media Queries
// ============================================================================

/// List media assets, newest first.
pub async fn list_media(pool: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<MediaAsset>> {
    sqlx::query_as::<_, MediaAsset>(
        "SELECT * FROM media ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_media"))
}

/// Find media asset by ID.
pub async fn find_media_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<MediaAsset>> {
    sqlx::query_as::<_, MediaAsset>("SELECT * FROM media WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_media_by_id", media_id = %id))
}

/// Find media asset by content hash (duplicate detection pre-check; the
/// unique index on `content_hash` is the authoritative guard).
pub async fn find_media_by_hash(pool: &PgPool, hash: &str) -> sqlx::Result<Option<MediaAsset>> {
    sqlx::query_as::<_, MediaAsset>("SELECT * FROM media WHERE content_hash = $1")
        .bind(hash)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_media_by_hash", content_hash = %hash))
}

/// Insert a media asset row and its tag associations in one transaction.
pub async fn insert_media(
    pool: &PgPool,
    asset: &NewMediaAsset<'_>,
    tag_ids: &[Uuid],
) -> sqlx::Result<MediaAsset> {
    let mut tx = pool.begin().await?;

    let media = sqlx::query_as::<_, MediaAsset>(
        r"
        INSERT INTO media (
            filename, mime_type, size_bytes, content_hash, width, height, blurhash,
            title, alt_text, caption, category_id, uploaded_by,
            original_key, thumbnail_key, medium_key, large_key
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        ",
    )
    .bind(asset.filename)
    .bind(asset.mime_type)
    .bind(asset.size_bytes)
    .bind(asset.content_hash)
    .bind(asset.width)
    .bind(asset.height)
    .bind(asset.blurhash)
    .bind(Json(asset.title))
    .bind(Json(asset.alt_text))
    .bind(Json(asset.caption))
    .bind(asset.category_id)
    .bind(asset.uploaded_by)
    .bind(asset.original_key)
    .bind(asset.thumbnail_key)
    .bind(asset.medium_key)
    .bind(asset.large_key)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error!("insert_media", content_hash = %asset.content_hash))?;

    for tag_id in tag_ids {
        sqlx::query("INSERT INTO media_tags (media_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(media.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("insert_media", media_id = %media.id, tag_id = %tag_id))?;
    }

    tx.commit().await?;
    Ok(media)
}

/// Update media metadata with full replacement values. Returns the updated
/// row if it exists.
pub async fn update_media_metadata(
    pool: &PgPool,
    id: Uuid,
    title: &LocalizedText,
    alt_text: &LocalizedText,
    caption: &LocalizedText,
    category_id: Option<Uuid>,
) -> sqlx::Result<Option<MediaAsset>> {
    sqlx::query_as::<_, MediaAsset>(
        r"
        UPDATE media
        SET title = $2, alt_text = $3, caption = $4, category_id = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(Json(title))
    .bind(Json(alt_text))
    .bind(Json(caption))
    .bind(category_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("update_media_metadata", media_id = %id))
}

/// Delete a media asset row. Returns whether a row was removed. Variant
/// objects in storage are the caller's responsibility.
pub async fn delete_media(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM media WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_media", media_id = %id))?;
    Ok(result.rows_affected() > 0)
}

/// Replace the tag set of a media asset.
pub async fn set_media_tags(pool: &PgPool, media_id: Uuid, tag_ids: &[Uuid]) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM media_tags WHERE media_id = $1")
        .bind(media_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("set_media_tags", media_id = %media_id))?;
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO media_tags (media_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(media_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("set_media_tags", media_id = %media_id, tag_id = %tag_id))?;
    }
    tx.commit().await
}

/// Tags attached to a media asset.
pub async fn list_media_tags(pool: &PgPool, media_id: Uuid) -> sqlx::Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>(
        r"
        SELECT t.* FROM tags t
        JOIN media_tags mt ON mt.tag_id = t.id
        WHERE mt.media_id = $1
        ORDER BY t.slug
        ",
    )
    .bind(media_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_media_tags", media_id = %media_id))
}

// ============================================================================
// Audit Queries
// ============================================================================

/// Append an audit log entry.
pub async fn insert_audit_entry(
    pool: &PgPool,
    actor_id: Uuid,
    action: &str,
    target_type: Option<&str>,
    target_id: Option<Uuid>,
    details: Option<&serde_json::Value>,
) -> sqlx::Result<AuditLogEntry> {
    sqlx::query_as::<_, AuditLogEntry>(
        r"
        INSERT INTO audit_log (actor_id, action, target_type, target_id, details)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(actor_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details)
    .fetch_one(pool)
    .await
    .map_err(db_error!("insert_audit_entry", action = %action))
}

/// List audit entries, newest first.
pub async fn list_audit_entries(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<AuditLogEntry>> {
    sqlx::query_as::<_, AuditLogEntry>(
        "SELECT * FROM audit_log ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_audit_entries"))
}
