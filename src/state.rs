//! Application state: settings and the shared HTTP client, plus per-request provider selection.
//!
//! Nothing request-specific lives here. Each request builds its own provider handle
//! and its own calibration state.

use std::time::Duration;

use tracing::{info, instrument};

use crate::config::Settings;
use crate::error::AppError;
use crate::providers::{GroqProvider, OllamaProvider, ProviderKind, TextProvider};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build state from env (.env, optional TOML, env overrides).
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, reqwest::Error> {
        Self::with_settings(Settings::from_env())
    }

    pub fn with_settings(settings: Settings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        info!(
            target: "lector_backend",
            default_provider = %settings.default_provider,
            ollama_host = %settings.ollama_host,
            ollama_model = %settings.ollama_model,
            groq_base_url = %settings.groq_base_url,
            groq_model = %settings.groq_model,
            groq_key_present = settings.groq_api_key.is_some(),
            max_iterations = settings.max_iterations,
            "Settings loaded"
        );

        Ok(Self { settings, http })
    }

    /// Resolve the provider for a request. Missing identifiers fall back to the
    /// configured default; missing models fall back to that provider's default.
    #[instrument(level = "debug", skip(self))]
    pub fn provider(&self, requested: Option<&str>, model: Option<&str>) -> Result<Box<dyn TextProvider>, AppError> {
        let id = requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.settings.default_provider);
        let model = model.map(str::trim).filter(|m| !m.is_empty());
        let timeout = Duration::from_secs(self.settings.request_timeout_secs);

        Ok(match id.parse::<ProviderKind>()? {
            ProviderKind::Ollama => Box::new(OllamaProvider::new(
                &self.settings.ollama_host,
                model.unwrap_or(&self.settings.ollama_model),
                timeout,
            )),
            ProviderKind::Groq => Box::new(GroqProvider::new(
                self.http.clone(),
                self.settings.groq_api_key.clone(),
                &self.settings.groq_base_url,
                model.unwrap_or(&self.settings.groq_model),
                timeout,
            )),
        })
    }
}
