//! Ollama client for a local model server.
//!
//! The transport is synchronous (`reqwest::blocking`) and always runs on the blocking
//! pool via `spawn_blocking`, so a slow local model never stalls the async workers.
//! `/api/generate` takes one prompt and one optional system string, so a message list
//! collapses to its first system message and first user message.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{non_empty, ChatMessage, Completion, GenerateOptions, Role, TextProvider};
use crate::error::{ProviderError, ProviderFailure};

const NAME: &str = "ollama";

#[derive(Clone, Debug)]
pub struct OllamaProvider {
  host: String,
  model: String,
  timeout: Duration,
}

impl OllamaProvider {
  pub fn new(host: &str, model: &str, timeout: Duration) -> Self {
    Self { host: host.trim_end_matches('/').to_string(), model: model.to_string(), timeout }
  }
}

/// First system + first user message; later turns are not representable here.
fn collapse(messages: &[ChatMessage]) -> (Option<String>, String) {
  let first = |role: Role| messages.iter().find(|m| m.role == role).map(|m| m.content.clone());
  (first(Role::System), first(Role::User).unwrap_or_default())
}

#[async_trait]
impl TextProvider for OllamaProvider {
  fn name(&self) -> &'static str { NAME }

  fn model(&self) -> &str { &self.model }

  #[instrument(level = "info", skip(self, messages, options), fields(model = %self.model, json_mode = options.json_mode, n_messages = messages.len()))]
  async fn generate(&self, messages: &[ChatMessage], options: &GenerateOptions) -> Result<Completion, ProviderError> {
    let (system, prompt) = collapse(messages);
    let req = GenerateRequest {
      model: self.model.clone(),
      prompt,
      system,
      stream: false,
      format: options.json_mode.then_some("json"),
      options: options.temperature.map(|temperature| ModelOptions { temperature }),
    };
    let url = format!("{}/api/generate", self.host);
    let timeout = self.timeout;

    let start = Instant::now();
    let resp = run_blocking(move || {
      let client = blocking_client(timeout)?;
      let res = client.post(&url).json(&req).send().map_err(|e| ProviderFailure::from_reqwest(e, timeout))?;
      read_json::<GenerateResponse>(res, timeout)
    })
    .await?;

    let content = non_empty(&resp.response).ok_or_else(|| ProviderError::new(NAME, ProviderFailure::EmptyContent))?;
    info!(elapsed = ?start.elapsed(), content_len = content.len(), eval_count = ?resp.eval_count, "Ollama completion received");
    Ok(Completion { content })
  }
}

/// Entry from `GET {host}/api/tags`.
#[derive(Clone, Debug, Deserialize)]
pub struct OllamaModel {
  #[serde(default)] pub name: Option<String>,
  #[serde(default)] pub model: Option<String>,
  #[serde(default)] pub size: Option<u64>,
  #[serde(default)] pub details: Option<serde_json::Value>,
}

impl OllamaModel {
  pub fn id(&self) -> Option<&str> {
    self.model.as_deref().or(self.name.as_deref())
  }
}

/// List locally pulled models.
#[instrument(level = "info")]
pub async fn list_models(host: &str, timeout: Duration) -> Result<Vec<OllamaModel>, ProviderError> {
  #[derive(Deserialize)]
  struct Tags { #[serde(default)] models: Vec<OllamaModel> }

  let url = format!("{}/api/tags", host.trim_end_matches('/'));
  let tags = run_blocking(move || {
    let client = blocking_client(timeout)?;
    let res = client.get(&url).send().map_err(|e| ProviderFailure::from_reqwest(e, timeout))?;
    read_json::<Tags>(res, timeout)
  })
  .await?;
  Ok(tags.models)
}

/// Run a blocking call on the blocking pool and await it.
async fn run_blocking<T, F>(f: F) -> Result<T, ProviderError>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T, ProviderFailure> + Send + 'static,
{
  match tokio::task::spawn_blocking(f).await {
    Ok(r) => r.map_err(|failure| ProviderError::new(NAME, failure)),
    Err(e) => Err(ProviderError::new(NAME, ProviderFailure::Worker(e.to_string()))),
  }
}

fn blocking_client(timeout: Duration) -> Result<reqwest::blocking::Client, ProviderFailure> {
  reqwest::blocking::Client::builder()
    .timeout(timeout)
    .build()
    .map_err(|e| ProviderFailure::Transport(e.to_string()))
}

fn read_json<T: for<'a> Deserialize<'a>>(res: reqwest::blocking::Response, timeout: Duration) -> Result<T, ProviderFailure> {
  if !res.status().is_success() {
    let status = res.status().as_u16();
    let body = res.text().unwrap_or_default();
    let message = extract_ollama_error(&body).unwrap_or(body);
    return Err(ProviderFailure::Status { status, message });
  }
  res.json::<T>().map_err(|e| ProviderFailure::from_reqwest(e, timeout))
}

/// Ollama reports errors as `{"error": "..."}`.
fn extract_ollama_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct E { error: String }
  serde_json::from_str::<E>(body).ok().map(|e| e.error)
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateRequest {
  model: String,
  prompt: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  system: Option<String>,
  stream: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  format: Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  options: Option<ModelOptions>,
}
#[derive(Serialize)]
struct ModelOptions { temperature: f32 }

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)] response: String,
  #[serde(default)] eval_count: Option<u64>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{body_json, body_partial_json, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[test]
  fn collapse_keeps_first_system_and_first_user() {
    let msgs = vec![
      ChatMessage::user("first user"),
      ChatMessage::system("first system"),
      ChatMessage::user("second user"),
      ChatMessage::system("second system"),
    ];
    assert_eq!(collapse(&msgs), (Some("first system".into()), "first user".into()));
    assert_eq!(collapse(&[ChatMessage::user("only")]), (None, "only".into()));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn posts_collapsed_prompt_without_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate"))
      .and(body_json(json!({
        "model": "gemma3:12b",
        "prompt": "write",
        "system": "sys",
        "stream": false
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Lava is hot.\n", "done": true })))
      .expect(1)
      .mount(&server)
      .await;

    let p = OllamaProvider::new(&server.uri(), "gemma3:12b", Duration::from_secs(5));
    let out = p
      .generate(&[ChatMessage::system("sys"), ChatMessage::user("write")], &GenerateOptions::default())
      .await
      .unwrap();
    assert_eq!(out.content, "Lava is hot.");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn json_mode_and_temperature_map_to_format_and_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate"))
      .and(body_partial_json(json!({ "format": "json", "options": { "temperature": 0.5 } })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "{\"questions\": []}" })))
      .expect(1)
      .mount(&server)
      .await;

    let p = OllamaProvider::new(&server.uri(), "gemma3:12b", Duration::from_secs(5));
    let opts = GenerateOptions { temperature: Some(0.5), json_mode: true };
    assert!(p.generate(&[ChatMessage::user("q")], &opts).await.is_ok());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn missing_model_surfaces_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "model \"nope\" not found" })))
      .mount(&server)
      .await;

    let p = OllamaProvider::new(&server.uri(), "nope", Duration::from_secs(5));
    let err = p.generate(&[ChatMessage::user("q")], &GenerateOptions::default()).await.unwrap_err();
    assert_eq!(err.provider, "ollama");
    assert!(matches!(err.failure, ProviderFailure::Status { status: 404, ref message } if message.contains("not found")));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)).set_body_json(json!({ "response": "late" })))
      .mount(&server)
      .await;

    let p = OllamaProvider::new(&server.uri(), "gemma3:12b", Duration::from_millis(200));
    let err = p.generate(&[ChatMessage::user("q")], &GenerateOptions::default()).await.unwrap_err();
    assert!(matches!(err.failure, ProviderFailure::Timeout(_)));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn unreachable_host_is_a_transport_failure() {
    // Port 9 (discard) is closed on test hosts.
    let p = OllamaProvider::new("http://127.0.0.1:9", "gemma3:12b", Duration::from_secs(2));
    let err = p.generate(&[ChatMessage::user("q")], &GenerateOptions::default()).await.unwrap_err();
    assert!(matches!(err.failure, ProviderFailure::Transport(_)));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn lists_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/tags"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "models": [{ "name": "gemma3:12b", "model": "gemma3:12b", "size": 8149190253u64 }]
      })))
      .mount(&server)
      .await;

    let models = list_models(&server.uri(), Duration::from_secs(5)).await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id(), Some("gemma3:12b"));
  }
}
