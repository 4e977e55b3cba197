//! Language procedures.
//!
//! Languages are keyed by locale code. Deletion is literal: the targeted row
//! is removed, with two guards — the configured default locale and the last
//! enabled language cannot be deleted.

use serde::{Deserialize, Serialize};
use validator::Validate;

use pepper_common::LocaleCode;
use pepper_rbac::{Action, Resource};

use crate::db::{self, Language};
use crate::rpc::{validate_input, Procedure, ProcedureContext, ProcedureRegistry, RpcError};

use super::map_db_error;
use super::tags::DeleteResult;

/// Input for `language.create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLanguageInput {
    /// Locale code; validated and normalized by [`LocaleCode`].
    pub code: LocaleCode,
    /// English name ("Vietnamese").
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Native name ("Tiếng Việt").
    #[validate(length(min = 1, max = 64))]
    pub native_name: String,
    /// Whether the language is selectable for content.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Input for `language.update`. Omitted fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLanguageInput {
    pub code: LocaleCode,
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub native_name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Input for `language.delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteLanguageInput {
    pub code: LocaleCode,
}

/// Register language procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    registry.register(
        Procedure::builder("language.list")
            .authorized(Resource::Language, Action::View)
            .handler(list),
    );
    registry.register(
        Procedure::builder("language.create")
            .authorized(Resource::Language, Action::Create)
            .handler(create),
    );
    registry.register(
        Procedure::builder("language.update")
            .authorized(Resource::Language, Action::Update)
            .handler(update),
    );
    registry.register(
        Procedure::builder("language.delete")
            .authorized(Resource::Language, Action::Delete)
            .handler(delete),
    );
}

async fn list(
    ctx: ProcedureContext,
    _input: serde::de::IgnoredAny,
) -> Result<Vec<Language>, RpcError> {
    Ok(db::list_languages(&ctx.state.db).await?)
}

async fn create(ctx: ProcedureContext, input: CreateLanguageInput) -> Result<Language, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    let language = db::create_language(
        &ctx.state.db,
        input.code.as_str(),
        &input.name,
        &input.native_name,
        input.enabled,
    )
    .await
    .map_err(|e| map_db_error(e, "Language"))?;

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "language.create",
        Some("language"),
        None,
        Some(&serde_json::json!({ "code": language.code })),
    )
    .await;

    Ok(language)
}

async fn update(ctx: ProcedureContext, input: UpdateLanguageInput) -> Result<Language, RpcError> {
    let actor = ctx.actor()?;
    validate_input(&input)?;

    let existing = db::find_language(&ctx.state.db, input.code.as_str())
        .await?
        .ok_or(RpcError::NotFound("Language"))?;

    let name = input.name.unwrap_or_else(|| existing.name.clone());
    let native_name = input
        .native_name
        .unwrap_or_else(|| existing.native_name.clone());
    let enabled = input.enabled.unwrap_or(existing.enabled);

    // Disabling the last enabled language would leave content unreachable.
    if existing.enabled && !enabled && db::count_enabled_languages(&ctx.state.db).await? <= 1 {
        return Err(RpcError::Conflict(
            "At least one language must stay enabled".to_string(),
        ));
    }

    let updated = db::update_language(&ctx.state.db, input.code.as_str(), &name, &native_name, enabled)
        .await?
        .ok_or(RpcError::NotFound("Language"))?;

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "language.update",
        Some("language"),
        None,
        Some(&serde_json::json!({ "code": updated.code })),
    )
    .await;

    Ok(updated)
}

async fn delete(
    ctx: ProcedureContext,
    input: DeleteLanguageInput,
) -> Result<DeleteResult, RpcError> {
    let actor = ctx.actor()?;

    if input.code == ctx.state.config.default_locale {
        return Err(RpcError::Conflict(
            "The default locale cannot be deleted".to_string(),
        ));
    }

    let existing = db::find_language(&ctx.state.db, input.code.as_str())
        .await?
        .ok_or(RpcError::NotFound("Language"))?;

    if existing.enabled && db::count_enabled_languages(&ctx.state.db).await? <= 1 {
        return Err(RpcError::Conflict(
            "The last enabled language cannot be deleted".to_string(),
        ));
    }

    let deleted = db::delete_language(&ctx.state.db, input.code.as_str()).await?;
    if !deleted {
        return Err(RpcError::NotFound("Language"));
    }

    crate::audit::record(
        &ctx.state.db,
        actor.id,
        "language.delete",
        Some("language"),
        None,
        Some(&serde_json::json!({ "code": input.code.as_str() })),
    )
    .await;

    Ok(DeleteResult { deleted: true })
}
