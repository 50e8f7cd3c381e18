//! Caller-facing errors.
//!
//! Provider failures never surface here: they are contained inside the
//! aggregator and logged. Only malformed calls (bad platform tag, out of range
//! options) are reported back to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::types::Platform;

pub type Result<T> = std::result::Result<T, TrendError>;

#[derive(Error, Debug)]
pub enum TrendError {
    #[error("unknown platform '{0}' (expected reddit, tiktok, youtube or all)")]
    UnknownPlatform(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no provider registered for platform '{0}'")]
    NoProvider(Platform),
}

impl TrendError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        TrendError::InvalidOption(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TrendError::UnknownPlatform(_) | TrendError::InvalidOption(_) => {
                StatusCode::BAD_REQUEST
            }
            TrendError::NoProvider(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            TrendError::UnknownPlatform(_) => "unknown_platform",
            TrendError::InvalidOption(_) => "invalid_option",
            TrendError::NoProvider(_) => "no_provider",
        }
    }
}

impl IntoResponse for TrendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(error = %self, "rejected trends request");

        let body = Json(json!({
            "success": false,
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
                "status": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}
