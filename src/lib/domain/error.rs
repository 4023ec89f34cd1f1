use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Every failure a todo request can end in. The `Display` text of each
/// variant is exactly the message sent back to the client.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("'{0}' is not a valid todo ID")]
    InvalidIdentifier(String),
    #[error("No task was provided")]
    MissingField,
    #[error("{0}")]
    EmptyField(&'static str),
    #[error("{0}")]
    WrongType(String),
    #[error("The request body must be a JSON object")]
    InvalidRequestBody,
    #[error("Updating a todo requires a task and/or completed property")]
    NothingToUpdate,
    #[error("Request body is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("The request body is too large")]
    PayloadTooLarge,
    #[error("No todo with ID {0} was found in the database")]
    NotFound(String),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_)
            | AppError::MissingField
            | AppError::EmptyField(_)
            | AppError::WrongType(_)
            | AppError::InvalidRequestBody
            | AppError::NothingToUpdate
            | AppError::MalformedJson(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape shared by every error response and by the delete confirmation.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        #[cfg(feature = "tracing")]
        {
            if status.is_server_error() {
                tracing::error!(error = %self, "todo request failed");
            } else {
                tracing::warn!(status = status.as_u16(), error = %self, "todo request rejected");
            }
        }
        let body = MessageBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
