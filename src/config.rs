//! Service settings: provider defaults, credentials, loop bounds, CORS, and system prompts.
//!
//! Sources, later wins:
//!   1. built-in defaults
//!   2. TOML file at APP_CONFIG_PATH (optional)
//!   3. individual environment variables (see `Settings::apply_env`)

use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub default_provider: String,
  pub ollama_host: String,
  pub ollama_model: String,
  pub groq_base_url: String,
  pub groq_model: String,
  pub groq_api_key: Option<String>,
  pub max_iterations: usize,
  pub request_timeout_secs: u64,
  pub cors_origins: Vec<String>,
  pub prompts: Prompts,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      default_provider: "ollama".into(),
      ollama_host: "http://localhost:11434".into(),
      ollama_model: "gemma3:12b".into(),
      groq_base_url: "https://api.groq.com/openai/v1".into(),
      groq_model: "llama-3.1-8b-instant".into(),
      groq_api_key: None,
      max_iterations: 10,
      request_timeout_secs: 120,
      cors_origins: vec!["http://localhost:3000".into(), "http://127.0.0.1:3000".into()],
      prompts: Prompts::default(),
    }
  }
}

/// System instructions sent alongside the rendered user prompts.
/// Templates use `{key}` placeholders filled by `util::fill_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub passage_system: String,
  /// Placeholders: {language}, {style}, {level}
  pub single_shot_system_template: String,
  /// Placeholders: {language}, {num_questions}, {choices_num}
  pub question_system_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      passage_system: "You are a professional language teacher tasked to create a reading passage. Do not give any output besides the text; do not include things like 'ok here is your text' or 'here is the text'. Always make sure that the generated text is in English even if the topic is in another language.".into(),
      single_shot_system_template: "You are a professional language teacher tasked to create a reading passage. Do not give any output besides the text; do not include things like 'ok here is your text' or 'here is the text'. Always make sure that the generated text is in {language} even if the topic is in another language. Make sure that style is {style} and level is {level}.".into(),
      question_system_template: "You are an AI assistant specialized in creating multiple-choice comprehension questions based on provided text. Respond ONLY with the requested JSON object containing the questions. Ensure all text content (questions, choices, answers) is in {language}. Make sure that there are exactly {num_questions} questions and {choices_num} choices for each question.".into(),
    }
  }
}

impl Settings {
  /// Defaults, then the optional TOML file, then env overrides.
  pub fn from_env() -> Self {
    let mut settings = load_settings_file_from_env().unwrap_or_default();
    settings.apply_env(|key| std::env::var(key).ok());
    settings
  }

  /// Apply overrides from a key lookup. Split out so tests need not touch the process env.
  pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = non_empty("DEFAULT_PROVIDER") { self.default_provider = v; }
    if let Some(v) = non_empty("OLLAMA_HOST") { self.ollama_host = v; }
    if let Some(v) = non_empty("OLLAMA_MODEL") { self.ollama_model = v; }
    if let Some(v) = non_empty("GROQ_BASE_URL") { self.groq_base_url = v; }
    if let Some(v) = non_empty("GROQ_MODEL") { self.groq_model = v; }
    if let Some(v) = non_empty("GROQ_API_KEY") { self.groq_api_key = Some(v); }

    if let Some(v) = non_empty("MAX_ITERATIONS") {
      match v.parse::<usize>() {
        Ok(n) => self.max_iterations = n,
        Err(e) => warn!(target: "lector_backend", value = %v, error = %e, "Ignoring invalid MAX_ITERATIONS"),
      }
    }
    if let Some(v) = non_empty("REQUEST_TIMEOUT_SECS") {
      match v.parse::<u64>() {
        Ok(n) => self.request_timeout_secs = n,
        Err(e) => warn!(target: "lector_backend", value = %v, error = %e, "Ignoring invalid REQUEST_TIMEOUT_SECS"),
      }
    }

    // A zero budget would never produce a candidate.
    self.max_iterations = self.max_iterations.max(1);
  }
}

/// Attempt to load `Settings` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_settings_file_from_env() -> Option<Settings> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<Settings>(&s) {
      Ok(cfg) => {
        info!(target: "lector_backend", %path, "Loaded settings (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lector_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lector_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
