//! Stored profile pictures.

use actix_web::{HttpResponse, http::header, web};

use scribe_core::domain::{DEFAULT_PROFILE_PICTURE, ImageKind};
use scribe_core::ports::StorageError;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Served for users without an uploaded picture unless the upload dir holds its own.
const BUILTIN_DEFAULT_PICTURE: &[u8] = include_bytes!("../../assets/default.png");

/// GET /media/profile_pics/{file}
pub async fn profile_picture(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let file = path.into_inner();
    let kind = ImageKind::from_file_name(&file)
        .ok_or_else(|| AppError::from(StorageError::InvalidName(file.clone())))?;

    let body = match state.storage.get(&file).await? {
        Some(body) => body,
        None if file == DEFAULT_PROFILE_PICTURE => {
            bytes::Bytes::from_static(BUILTIN_DEFAULT_PICTURE)
        }
        None => return Err(AppError::NotFound(format!("{} not found", file))),
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, kind.mime()))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(body))
}
