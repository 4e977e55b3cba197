//! Media Subsystem
//!
//! Content-addressed media assets: multipart upload, filename sanitization,
//! SHA-256 deduplication, derived image variants, object storage, localized
//! metadata and the RPC procedures for managing persisted assets.

mod error;
pub mod handlers;
mod pipeline;
mod procedures;
mod processing;
mod sanitize;
mod storage;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;

use pepper_rbac::{Action, Resource};

use crate::api::AppState;
use crate::permissions::require_permission;

pub use error::MediaError;
pub use handlers::{download, upload};
pub use pipeline::{upload_media, UploadInput};
pub use procedures::{register_procedures, MediaResponse};
pub use processing::{process_image, ImageProcessingResult, ProcessedVariant, ProcessingError};
pub use sanitize::sanitize_filename;
pub use storage::{ObjectStorage, StorageError};

/// Routes for the authenticated media surface. Each route carries its own
/// permission layer; `require_auth` is applied by the caller.
///
/// - POST / — multipart upload (media/create)
/// - GET /{id}/download — stream a stored variant (media/view)
pub fn router() -> Router<AppState> {
    let upload_route = Router::new()
        .route("/", post(handlers::upload))
        .layer(from_fn(require_permission(Resource::Media, Action::Create)));

    let download_route = Router::new()
        .route("/{id}/download", get(handlers::download))
        .layer(from_fn(require_permission(Resource::Media, Action::View)));

    upload_route.merge(download_route)
}
