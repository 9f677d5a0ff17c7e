//! Error responses
//!
//! | Kind | Status |
//! |------|--------|
//! | validation, insufficient_stock, payment_verification | 400 |
//! | not_found | 404 |
//! | unexpected | 500 |
//!
//! Storage failures are logged in full; the caller only sees a generic
//! detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::CommerceError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub detail: String,
}

impl CommerceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InsufficientStock { .. } | Self::PaymentVerification => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PaymentNotConfigured | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Storage(msg) => {
                error!(target: "storage", error = %msg, "Storage error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { kind: self.kind(), detail })).into_response()
    }
}
