// src/error.rs
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Everything a handler can reject a request with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { field, message } => ErrorBody {
                status: "error",
                error: message,
                field: Some(field),
            },
            ApiError::Internal => ErrorBody {
                status: "error",
                error: "Internal server error",
                field: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // valid JSON, wrong shape: the only field we read is Barcode
            JsonRejection::JsonDataError(_) => {
                ApiError::validation("Barcode", "Barcode is required and must be a string")
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::validation("body", "Request body is not valid JSON")
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::validation("body", "Expected Content-Type: application/json")
            }
            _ => ApiError::validation("body", "Could not read request body"),
        }
    }
}

/// The generic 500 body, also used by the panic guard.
pub fn internal_error_response() -> Response {
    ApiError::Internal.into_response()
}
