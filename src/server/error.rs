use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::error::LlmError;
use crate::models::ErrorBody;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Agent(LlmError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Agent(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred during agent execution: {}", e),
            ),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        ApiError::Agent(e)
    }
}
