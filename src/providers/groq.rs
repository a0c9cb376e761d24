//! Groq client (OpenAI-compatible chat.completions).
//!
//! Requests either plain text or a strict JSON object. Calls are instrumented and log
//! model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{non_empty, ChatMessage, Completion, GenerateOptions, TextProvider};
use crate::error::{ProviderError, ProviderFailure};

const NAME: &str = "groq";
const UA: &str = "lector-backend/0.1";

#[derive(Clone)]
pub struct GroqProvider {
  client: reqwest::Client,
  api_key: Option<String>,
  base_url: String,
  model: String,
  timeout: Duration,
}

impl GroqProvider {
  /// `client` is shared across requests; it must already carry `timeout`.
  pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: &str, model: &str, timeout: Duration) -> Self {
    Self {
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
      timeout,
    }
  }

  fn fail(&self, failure: ProviderFailure) -> ProviderError {
    ProviderError::new(NAME, failure)
  }

  fn key(&self) -> Result<&str, ProviderError> {
    self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| self.fail(ProviderFailure::MissingCredentials))
  }
}

#[async_trait]
impl TextProvider for GroqProvider {
  fn name(&self) -> &'static str { NAME }

  fn model(&self) -> &str { &self.model }

  #[instrument(level = "info", skip(self, messages, options), fields(model = %self.model, json_mode = options.json_mode, n_messages = messages.len()))]
  async fn generate(&self, messages: &[ChatMessage], options: &GenerateOptions) -> Result<Completion, ProviderError> {
    let key = self.key()?;
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: &self.model,
      messages,
      temperature: options.temperature.unwrap_or(1.0),
      response_format: options.json_mode.then(|| ResponseFormat { r#type: "json_object" }),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", key))
      .json(&req).send().await
      .map_err(|e| self.fail(ProviderFailure::from_reqwest(e, self.timeout)))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_api_error(&body).unwrap_or(body);
      return Err(self.fail(ProviderFailure::Status { status, message }));
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| self.fail(ProviderFailure::from_reqwest(e, self.timeout)))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Groq usage");
    }

    let content = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| self.fail(ProviderFailure::MalformedResponse("no choices[0].message.content".into())))?;
    let content = non_empty(&content).ok_or_else(|| self.fail(ProviderFailure::EmptyContent))?;

    info!(elapsed = ?start.elapsed(), content_len = content.len(), "Groq completion received");
    Ok(Completion { content })
  }
}

/// Entry from `GET {base_url}/models`.
#[derive(Clone, Debug, Deserialize)]
pub struct GroqModel {
  pub id: String,
  #[serde(default)] pub created: Option<i64>,
  #[serde(default)] pub owned_by: Option<String>,
  #[serde(default)] pub context_window: Option<u64>,
}

/// List the models visible to `api_key`.
#[instrument(level = "info", skip(client, api_key))]
pub async fn list_models(client: &reqwest::Client, base_url: &str, api_key: &str, timeout: Duration) -> Result<Vec<GroqModel>, ProviderError> {
  #[derive(Deserialize)]
  struct ModelList { #[serde(default)] data: Vec<GroqModel> }

  let fail = |f| ProviderError::new(NAME, f);
  let url = format!("{}/models", base_url.trim_end_matches('/'));
  let res = client.get(&url)
    .header(USER_AGENT, UA)
    .header(AUTHORIZATION, format!("Bearer {}", api_key))
    .send().await
    .map_err(|e| fail(ProviderFailure::from_reqwest(e, timeout)))?;

  if !res.status().is_success() {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    return Err(fail(ProviderFailure::Status { status, message: extract_api_error(&body).unwrap_or(body) }));
  }
  let list: ModelList = res.json().await.map_err(|e| fail(ProviderFailure::from_reqwest(e, timeout)))?;
  Ok(list.data)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: &'a [ChatMessage],
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: &'static str }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
