//! Shared API types

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use super::templates;

/// Error rendered as an HTML error page
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },
    #[error("Not found: {message}")]
    NotFound { message: String },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a PuppetDB failure that happened before any response byte was sent
    pub fn from_puppetdb(e: puppetdb::Error) -> Self {
        if e.is_not_found() {
            tracing::debug!(error = %e, "PuppetDB resource not found");
            return Self::not_found("The requested resource does not exist in PuppetDB");
        }
        if e.is_bad_request() {
            tracing::warn!(error = %e, "PuppetDB rejected query");
            return Self::bad_request("PuppetDB rejected the query");
        }
        tracing::error!(error = %e, "PuppetDB error");
        Self::internal("PuppetDB request failed")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        };
        (status, Html(templates::error_page(status, &message))).into_response()
    }
}
