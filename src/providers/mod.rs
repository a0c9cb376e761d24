//! Text-completion backends behind one contract.
//!
//! - `ollama`: local model server, called through a blocking client on a worker thread
//! - `groq`: hosted OpenAI-compatible chat completions over HTTPS with bearer auth
//!
//! Both return `ProviderError` for every failure; an empty completion is a failure too.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, ProviderError};

pub mod groq;
pub mod ollama;

pub use groq::GroqProvider;
pub use ollama::OllamaProvider;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: Role::System, content: content.into() }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self { role: Role::User, content: content.into() }
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerateOptions {
  /// Backend default when `None`.
  pub temperature: Option<f32>,
  /// Ask the backend for a single JSON object.
  pub json_mode: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
  pub content: String,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
  /// Backend identifier used in logs and errors.
  fn name(&self) -> &'static str;

  fn model(&self) -> &str;

  fn supports_json_mode(&self) -> bool { true }

  async fn generate(&self, messages: &[ChatMessage], options: &GenerateOptions) -> Result<Completion, ProviderError>;
}

/// Backend selector carried by requests as a lowercase identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
  Ollama,
  Groq,
}

impl ProviderKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ProviderKind::Ollama => "ollama",
      ProviderKind::Groq => "groq",
    }
  }
}

impl fmt::Display for ProviderKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProviderKind {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "ollama" => Ok(ProviderKind::Ollama),
      "groq" => Ok(ProviderKind::Groq),
      _ => Err(AppError::UnknownProvider(s.to_string())),
    }
  }
}

/// Drop speech models from listings; they cannot write passages.
pub fn is_text_model(id: &str) -> bool {
  let id = id.to_lowercase();
  !id.contains("whisper") && !id.contains("tts")
}

/// Trimmed content, or `None` when the backend returned only whitespace.
pub(crate) fn non_empty(content: &str) -> Option<String> {
  let t = content.trim();
  if t.is_empty() { None } else { Some(t.to_string()) }
}
