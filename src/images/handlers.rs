use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn uploads_routes() -> Router<AppState> {
    Router::new().route("/uploads/:filename", get(get_upload))
}

/// GET /uploads/:filename
#[instrument(skip(state))]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let body = state
        .content
        .get_object(&filename)
        .await?
        .ok_or(AppError::FileNotFound)?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], body).into_response())
}
