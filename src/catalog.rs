//! Model listing across providers. A failing provider degrades to its default model.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::config::Settings;
use crate::providers::{groq, is_text_model, ollama, ProviderKind};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ModelInfo {
  pub id: String,
  pub provider: String,
  pub details: Value,
}

impl ModelInfo {
  fn fallback(kind: ProviderKind, id: &str) -> Self {
    Self { id: id.to_string(), provider: kind.to_string(), details: json!({}) }
  }
}

#[instrument(level = "info", skip_all)]
pub async fn list_models(settings: &Settings, http: &reqwest::Client) -> Vec<ModelInfo> {
  let timeout = Duration::from_secs(settings.request_timeout_secs);
  let mut models = ollama_models(settings, timeout).await;
  models.extend(groq_models(settings, http, timeout).await);
  models
}

async fn ollama_models(settings: &Settings, timeout: Duration) -> Vec<ModelInfo> {
  let fallback = || vec![ModelInfo::fallback(ProviderKind::Ollama, &settings.ollama_model)];
  match ollama::list_models(&settings.ollama_host, timeout).await {
    Ok(list) => {
      let models: Vec<ModelInfo> = list
        .iter()
        .filter_map(|m| m.id().map(|id| (id, m)))
        .filter(|(id, _)| is_text_model(id))
        .map(|(id, m)| ModelInfo {
          id: id.to_string(),
          provider: ProviderKind::Ollama.to_string(),
          details: json!({ "size": m.size.unwrap_or(0), "details": m.details.clone().unwrap_or(Value::Null) }),
        })
        .collect();
      if models.is_empty() { fallback() } else { models }
    }
    Err(e) => {
      warn!(target: "lector_backend", error = %e, "Could not fetch models from Ollama; using default");
      fallback()
    }
  }
}

async fn groq_models(settings: &Settings, http: &reqwest::Client, timeout: Duration) -> Vec<ModelInfo> {
  let fallback = || vec![ModelInfo::fallback(ProviderKind::Groq, &settings.groq_model)];
  let Some(key) = settings.groq_api_key.as_deref().filter(|k| !k.is_empty()) else {
    return fallback();
  };
  match groq::list_models(http, &settings.groq_base_url, key, timeout).await {
    Ok(list) => {
      let models: Vec<ModelInfo> = list
        .into_iter()
        .filter(|m| is_text_model(&m.id))
        .map(|m| ModelInfo {
          details: json!({ "created": m.created, "owned_by": m.owned_by, "context_window": m.context_window }),
          id: m.id,
          provider: ProviderKind::Groq.to_string(),
        })
        .collect();
      if models.is_empty() { fallback() } else { models }
    }
    Err(e) => {
      warn!(target: "lector_backend", error = %e, "Could not fetch models from Groq; using default");
      fallback()
    }
  }
}
