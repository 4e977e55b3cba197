//! Localized Content
//!
//! CRUD procedures for posts, products, categories, tags and languages. All
//! mutations are permission-guarded and audited; slugs are unique per table.

mod categories;
mod languages;
mod posts;
mod products;
mod tags;

use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

use crate::rpc::{ProcedureRegistry, RpcError};

lazy_static! {
    /// Slug shape shared by every content table.
    pub(crate) static ref SLUG_REGEX: Regex =
        Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("static regex");
}

/// Register all content procedures.
pub fn register_procedures(registry: &mut ProcedureRegistry) {
    posts::register_procedures(registry);
    products::register_procedures(registry);
    categories::register_procedures(registry);
    tags::register_procedures(registry);
    languages::register_procedures(registry);
}

/// Render Markdown to HTML for read responses.
pub(crate) fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Map a content-table database error onto the RPC taxonomy: unique
/// violations are slug/sku conflicts, foreign keys are bad references.
pub(crate) fn map_db_error(e: sqlx::Error, what: &'static str) -> RpcError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return RpcError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RpcError::Validation(format!("Unknown reference in {what}"));
        }
    }
    RpcError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex() {
        for good in ["post", "my-post", "a1-b2-c3", "2024"] {
            assert!(SLUG_REGEX.is_match(good), "{good:?} should match");
        }
        for bad in ["", "My-Post", "a--b", "-a", "a-", "a_b", "a b"] {
            assert!(!SLUG_REGEX.is_match(bad), "{bad:?} should not match");
        }
    }

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# Title\n\nSome *emphasis*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn test_render_markdown_tables_enabled() {
        let html = render_markdown("|a|b|\n|-|-|\n|1|2|");
        assert!(html.contains("<table>"));
    }
}
