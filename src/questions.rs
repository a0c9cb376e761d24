//! Multiple-choice comprehension questions for a passage.
//!
//! One prompt, one provider call in JSON mode, then strict parsing into `QuestionSet`.
//! A wrong question count is only a warning; unparseable output is an error that
//! carries the raw model text.

use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::QuestionSet;
use crate::error::AppError;
use crate::prompts::build_question_prompt;
use crate::providers::{ChatMessage, GenerateOptions, TextProvider};
use crate::util::{fill_template, trunc_for_log};

const QUESTION_TEMPERATURE: f32 = 0.5;

#[instrument(level = "info", skip(provider, prompts, passage), fields(provider = provider.name(), model = %provider.model(), passage_len = passage.len()))]
pub async fn generate_questions(
  provider: &dyn TextProvider,
  prompts: &Prompts,
  passage: &str,
  language: &str,
  num_questions: usize,
  choices_num: usize,
) -> Result<QuestionSet, AppError> {
  if passage.trim().is_empty() {
    return Err(AppError::Input("Generated text cannot be empty".into()));
  }
  if num_questions == 0 {
    return Err(AppError::Input("num_questions must be at least 1".into()));
  }
  if choices_num < 2 {
    return Err(AppError::Input("choices_num must be at least 2".into()));
  }

  let (n_q, n_c) = (num_questions.to_string(), choices_num.to_string());
  let system = fill_template(
    &prompts.question_system_template,
    &[("language", language), ("num_questions", &n_q), ("choices_num", &n_c)],
  );
  let user = build_question_prompt(passage, language, num_questions, choices_num);
  let options = GenerateOptions {
    temperature: Some(QUESTION_TEMPERATURE),
    json_mode: provider.supports_json_mode(),
  };

  let completion = provider.generate(&[ChatMessage::system(system), ChatMessage::user(user)], &options).await?;
  let set = parse_question_set(&completion.content)?;

  if set.questions.len() != num_questions {
    warn!(target: "questions", requested = num_questions, returned = set.questions.len(), "Question count mismatch; returning what the model generated");
  }
  for (i, q) in set.questions.iter().enumerate() {
    if q.choices.len() != choices_num {
      warn!(target: "questions", index = i, requested = choices_num, returned = q.choices.len(), "Choice count mismatch");
    }
    if !q.choices.iter().any(|c| c == &q.answer) {
      warn!(target: "questions", index = i, "Answer is not one of the choices");
    }
  }
  info!(target: "questions", count = set.questions.len(), "Questions generated");
  Ok(set)
}

/// Parse model output, keeping the raw text on failure for diagnosis.
pub fn parse_question_set(raw: &str) -> Result<QuestionSet, AppError> {
  serde_json::from_str::<QuestionSet>(raw).map_err(|e| {
    error!(target: "questions", error = %e, raw = %trunc_for_log(raw, 500), "Failed to parse or validate JSON questions");
    AppError::InvalidModelOutput { reason: e.to_string(), raw: raw.to_string() }
  })
}
