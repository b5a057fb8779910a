use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Every way a request can fail. The first seven are client mistakes in a
/// submission and always map to 400.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{} is required", field_label(.0))]
    MissingField(&'static str),

    #[error("{} must be at most {max} characters", field_label(.field))]
    FieldTooLong { field: &'static str, max: usize },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid phone number. Format: +2348012345678 or 08012345678")]
    InvalidPhone,

    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,

    #[error("Could not read image: {0}")]
    ImageDecode(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Malformed form data: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Expected a multipart form: {}", .0.body_text())]
    NotMultipart(#[from] MultipartRejection),

    #[error("File not found")]
    FileNotFound,

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::FieldTooLong { .. }
            | AppError::InvalidEmail
            | AppError::InvalidPhone
            | AppError::InvalidDate
            | AppError::ImageDecode(_)
            | AppError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::NotMultipart(e) => e.status(),
            AppError::FileNotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(error = %message, "request failed");
        } else {
            warn!(error = %message, %status, "request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `date_of_birth` -> `Date Of Birth`
fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub type AppResult<T> = Result<T, AppError>;
