use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

/// Per-request failures. Each maps to a status line and a short plain-text
/// reason; nothing is retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Template error")]
    Template(#[from] tera::Error),
}

impl AppError {
    /// Map a store failure: a missing row becomes a 404 with `not_found`,
    /// anything else a 500 with `failed`.
    pub fn from_store(err: StoreError, not_found: &'static str, failed: &'static str) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound(not_found),
            source => AppError::Store {
                context: failed,
                source,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Store { context, source } => {
                tracing::error!(error = %source, "{context}");
            }
            AppError::Template(err) => {
                tracing::error!(error = %err, "template rendering failed");
            }
            _ => {}
        }
        (status, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
