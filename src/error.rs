//! Error taxonomy for the service and its mapping onto HTTP responses.

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failure of an upstream provider call. Never retried here.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{source_name} request failed: {error}")]
    Http {
        source_name: &'static str,
        #[source]
        error: reqwest::Error,
    },

    #[error("{source_name} responded with HTTP {status}")]
    Status {
        source_name: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{source_name} returned a malformed payload: {detail}")]
    Payload {
        source_name: &'static str,
        detail: String,
    },
}

/// Application errors surfaced by the HTTP API.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("External data source unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        invalid_parameters: Vec<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            invalid_parameters: Vec::new(),
        }
    }

    pub fn country_not_found(name: &str) -> Self {
        AppError::NotFound(format!("Country '{name}' not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(format!("database error: {e}"))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_parameters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_parameters: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("{self}");
        }

        let (invalid_parameters, valid_parameters) = match &self {
            AppError::Validation {
                invalid_parameters, ..
            } if !invalid_parameters.is_empty() => (
                Some(invalid_parameters.clone()),
                Some(
                    crate::query::VALID_PARAMETERS
                        .iter()
                        .map(|p| p.to_string())
                        .collect(),
                ),
            ),
            _ => (None, None),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            invalid_parameters,
            valid_parameters,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
