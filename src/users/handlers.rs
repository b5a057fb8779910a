use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppResult,
    state::AppState,
    users::{
        dto::{PublicUser, RegistrationForm, SubmitResponse},
        services::register_user,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /api/submit (multipart)
#[instrument(skip(state, mp))]
pub async fn submit(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    let form = RegistrationForm::from_multipart(mp?).await?;
    let user = register_user(&state, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "Registration successful!".into(),
            user: user.into(),
        }),
    ))
}

/// GET /api/users
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<PublicUser>>> {
    let users = state.users.list_all().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
