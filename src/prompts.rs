//! User-prompt rendering for passage and question generation.
//!
//! All functions here are pure: identical inputs always render identical strings.
//! System instructions live in `config::Prompts` so they can be tuned from TOML.

use crate::domain::Level;

/// Vocabulary guidance keyed by level.
fn vocabulary_hint(level: Level) -> &'static str {
  match level {
    Level::Basic => "simple sentences/common words",
    Level::Intermediate => "more complex sentences/some specialized terms",
    Level::Advanced => "complex structures/domain-specific vocabulary",
  }
}

/// Prompt for one iteration of the English calibration loop.
///
/// `prior_score` adds a directive steering the next attempt toward the level's band;
/// `prior_text` is appended verbatim so the model can adjust from it.
pub fn build_primary_prompt(
  topic: &str,
  level: Level,
  style: &str,
  prior_score: Option<f64>,
  prior_text: Option<&str>,
) -> String {
  let style_lc = style.to_lowercase();
  let mut prompt = format!(
    "Create a {lvl} level reading passage in English about \"{topic}\" with a {style_lc} tone.\n\
     Guidelines:\n\
     - Important: Even if the topic is in another language the entire text MUST be in English.\n\
     - Target Word Count: {words} words.\n\
     - Vocabulary/Complexity: Use vocabulary and sentence structures appropriate for the {level} level ({vocab}).\n\
     - Content: Ensure cohesive paragraphs with clear transitions. Develop the topic with appropriate depth for the level.\n\
     - Style: Maintain a consistent {style_lc} tone throughout.\n\
     - Output: Provide ONLY the reading passage text, nothing else. No introductory phrases, explanations, or formatting beyond paragraphs.",
    lvl = level.as_str().to_lowercase(),
    words = level.word_range(),
    vocab = vocabulary_hint(level),
  );

  if let Some(score) = prior_score {
    let band = level.band();
    let (low, high) = (band.low, band.high);
    let directive = if score < low {
      format!("The previous attempt scored {score:.2} (Gunning Fog), which was too simple for the target range {low}-{high}. Please generate a significantly more complex text.")
    } else if score > high {
      format!("The previous attempt scored {score:.2} (Gunning Fog), which was too complex for the target range {low}-{high}. Please generate a significantly simpler text.")
    } else {
      format!("The previous attempt scored {score:.2} (Gunning Fog). Aim closer to the middle of the target range {low}-{high}.")
    };
    prompt.push_str("\n- NOTE: ");
    prompt.push_str(&directive);
  }

  if let Some(text) = prior_text.filter(|t| !t.is_empty()) {
    prompt.push_str(&format!(
      "\n\nHere is the previous generated text for reference:\n---\n{text}\n---\nPlease use this as a reference and adjust the new passage accordingly."
    ));
  }

  prompt
}

/// Prompt for the single-shot path used for every language other than English.
pub fn build_single_shot_prompt(topic: &str, level: Level, language: &str, style: &str) -> String {
  let style_lc = style.to_lowercase();
  format!(
    "Create a {lvl} level reading passage strictly in the {language} language about \"{topic}\" with a {style_lc} tone.\n\
     Guidelines:\n\
     - Important: Even if the topic is in another language the entire text MUST be in {language}.\n\
     - Language: The entire text MUST be in {language}.\n\
     - Target Word Count: Approximately {words} words.\n\
     - Vocabulary/Complexity: Use vocabulary and sentence structures appropriate for a {level} learner of {language}.\n\
     - Content: Ensure cohesive paragraphs with clear transitions. Develop the topic with appropriate depth for the level.\n\
     - Style: Maintain a consistent {style_lc} tone throughout.\n\
     - Output: Provide ONLY the reading passage text in {language}, nothing else. No introductory phrases, explanations, or formatting beyond paragraphs.",
    lvl = level.as_str().to_lowercase(),
    words = level.word_range(),
  )
}

/// Fixed-template prompt asking for `num_questions` multiple-choice questions as JSON.
pub fn build_question_prompt(passage: &str, language: &str, num_questions: usize, choices_num: usize) -> String {
  format!(
    "Reading Passage ({language}):\n---\n{passage}\n---\n\n\
     Task: Based *only* on the reading passage above, generate exactly {num_questions} multiple-choice comprehension questions.\n\
     For each question:\n\
     1.  Provide the question itself.\n\
     2.  Provide exactly {choices_num} plausible answer choices (options). One choice must be the correct answer based on the text.\n\
     3.  Clearly indicate the correct answer.\n\
     4.  All questions, choices, and the answer text MUST be in the same language as the reading passage ({language}).\n\n\
     Format the output as a JSON object containing a single key \"questions\", which is a list of question objects.\n\
     Each question object should have the keys \"question\" (string), \"choices\" (list of {choices_num} strings), and \"answer\" (string - the correct choice text).\n\n\
     Example JSON structure:\n\
     {{\n  \"questions\": [\n    {{\n      \"question\": \"Sample question in {language}?\",\n      \"choices\": [\"Choice A in {language}\", \"Choice B in {language}\", \"Choice C in {language}\"],\n      \"answer\": \"Choice B in {language}\"\n    }}\n  ]\n}}\n\n\
     Generate the JSON output now based on the provided passage."
  )
}
