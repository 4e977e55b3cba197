//! Database Models

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use pepper_common::LocalizedText;

/// User account.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub password_hash: String,
    /// Role name; parsed into `pepper_rbac::Role` by the session resolver.
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the denormalized role → resource → action grant table.
#[derive(Debug, Clone, FromRow)]
pub struct RolePermission {
    pub role: String,
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}

/// Configured content language.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Language {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Content category.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: Json<LocalizedText>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content tag.
#[derive(Debug, Clone, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub slug: String,
    pub label: Json<LocalizedText>,
    pub created_at: DateTime<Utc>,
}

/// Localized post. The body is Markdown per locale, rendered on read.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: Json<LocalizedText>,
    pub excerpt: Json<LocalizedText>,
    pub body: Json<LocalizedText>,
    pub published: bool,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Localized product. Price is in minor units of `currency`.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub slug: String,
    pub name: Json<LocalizedText>,
    pub description: Json<LocalizedText>,
    pub price_cents: i64,
    pub currency: String,
    pub published: bool,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content-addressed media asset with derived image variants.
#[derive(Debug, Clone, FromRow)]
pub struct MediaAsset {
    pub id: Uuid,
    /// Sanitized filename (slug + lowercase extension).
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 of the original bytes; unique.
    pub content_hash: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub blurhash: Option<String>,
    pub title: Json<LocalizedText>,
    pub alt_text: Json<LocalizedText>,
    pub caption: Json<LocalizedText>,
    pub category_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    /// Storage key of the retained original bytes.
    pub original_key: String,
    pub thumbnail_key: Option<String>,
    pub medium_key: Option<String>,
    pub large_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<Uuid>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Insert parameters for a new media asset row.
#[derive(Debug)]
pub struct NewMediaAsset<'a> {
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: i64,
    pub content_hash: &'a str,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub blurhash: Option<&'a str>,
    pub title: &'a LocalizedText,
    pub alt_text: &'a LocalizedText,
    pub caption: &'a LocalizedText,
    pub category_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub original_key: &'a str,
    pub thumbnail_key: Option<&'a str>,
    pub medium_key: Option<&'a str>,
    pub large_key: Option<&'a str>,
}

/// Insert parameters for a new post row.
#[derive(Debug)]
pub struct NewPost<'a> {
    pub slug: &'a str,
    pub title: &'a LocalizedText,
    pub excerpt: &'a LocalizedText,
    pub body: &'a LocalizedText,
    pub published: bool,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
}

/// Insert parameters for a new product row.
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub sku: &'a str,
    pub slug: &'a str,
    pub name: &'a LocalizedText,
    pub description: &'a LocalizedText,
    pub price_cents: i64,
    pub currency: &'a str,
    pub published: bool,
    pub category_id: Option<Uuid>,
}
