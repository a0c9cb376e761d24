//! Reading-passage generation.
//!
//! English goes through the calibration loop. Every other language gets one prompt
//! and one provider call with no scoring: Gunning Fog is an English metric and
//! its score is meaningless elsewhere, so non-English results report `score: None`.

use tracing::{info, instrument};

use crate::calibration::Calibrator;
use crate::config::Prompts;
use crate::domain::{GeneratedPassage, Level};
use crate::error::AppError;
use crate::prompts::build_single_shot_prompt;
use crate::providers::{ChatMessage, GenerateOptions, TextProvider};
use crate::readability::gunning_fog;
use crate::util::fill_template;

/// Single-shot results shorter than this (in chars) are treated as failed generations.
const MIN_PASSAGE_CHARS: usize = 20;

pub fn is_english(language: &str) -> bool {
  language.trim().eq_ignore_ascii_case("english")
}

#[instrument(level = "info", skip(provider, prompts, topic, style), fields(provider = provider.name(), model = %provider.model(), topic_len = topic.len()))]
pub async fn generate_passage(
  provider: &dyn TextProvider,
  prompts: &Prompts,
  max_iterations: usize,
  topic: &str,
  language: &str,
  level: Level,
  style: &str,
) -> Result<GeneratedPassage, AppError> {
  if topic.trim().is_empty() {
    return Err(AppError::Input("Topic cannot be empty".into()));
  }

  if is_english(language) {
    let calibrator = Calibrator::new(provider, &prompts.passage_system, max_iterations, gunning_fog);
    let (passage, _termination) = calibrator.run(topic, level, style).await?;
    Ok(passage)
  } else {
    generate_single_shot(provider, prompts, topic, language, level, style).await
  }
}

#[instrument(level = "info", skip(provider, prompts, topic, style), fields(topic_len = topic.len()))]
async fn generate_single_shot(
  provider: &dyn TextProvider,
  prompts: &Prompts,
  topic: &str,
  language: &str,
  level: Level,
  style: &str,
) -> Result<GeneratedPassage, AppError> {
  let prompt = build_single_shot_prompt(topic, level, language, style);
  let system = fill_template(
    &prompts.single_shot_system_template,
    &[("language", language), ("style", style), ("level", level.as_str())],
  );
  let messages = [ChatMessage::system(system), ChatMessage::user(prompt.as_str())];
  let completion = provider.generate(&messages, &GenerateOptions::default()).await?;

  let chars = completion.content.chars().count();
  if chars < MIN_PASSAGE_CHARS {
    return Err(AppError::Generation(format!("generated text is too short ({chars} chars)")));
  }
  info!(target: "passage", %language, chars, "Single-shot passage generated");

  Ok(GeneratedPassage {
    generated_text: completion.content,
    score: None,
    level,
    language: language.to_string(),
    style: style.to_string(),
    iterations: 1,
    failed_texts: Vec::new(),
    prompts_used: vec![prompt],
  })
}
