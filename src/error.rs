//! Error types for provider calls and request handling, plus their HTTP mapping.

use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Single normalized failure from any text backend.
#[derive(Debug, thiserror::Error)]
#[error("{provider} request failed: {failure}")]
pub struct ProviderError {
  pub provider: &'static str,
  pub failure: ProviderFailure,
}

impl ProviderError {
  pub fn new(provider: &'static str, failure: ProviderFailure) -> Self {
    Self { provider, failure }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderFailure {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("missing API credentials")]
  MissingCredentials,
  #[error("timed out after {0:?}")]
  Timeout(Duration),
  #[error("malformed response: {0}")]
  MalformedResponse(String),
  #[error("response contained no text")]
  EmptyContent,
  #[error("background worker failed: {0}")]
  Worker(String),
}

impl ProviderFailure {
  /// Classify a reqwest error, keeping timeouts distinguishable.
  pub fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
    if e.is_timeout() {
      ProviderFailure::Timeout(timeout)
    } else if e.is_decode() {
      ProviderFailure::MalformedResponse(e.to_string())
    } else {
      ProviderFailure::Transport(e.to_string())
    }
  }
}

/// Anything a request can fail with, surfaced as one descriptive HTTP error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("{0}")]
  Input(String),
  #[error("unknown provider: {0}")]
  UnknownProvider(String),
  #[error(transparent)]
  Provider(#[from] ProviderError),
  #[error("text generation failed: {0}")]
  Generation(String),
  #[error("could not parse valid JSON questions from the model: {reason}")]
  InvalidModelOutput { reason: String, raw: String },
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Input(_) | AppError::UnknownProvider(_) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    let status = self.status();
    let body = match &self {
      AppError::InvalidModelOutput { raw, .. } => json!({ "detail": self.to_string(), "raw_output": raw }),
      _ => json!({ "detail": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
