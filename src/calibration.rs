//! Difficulty calibration for English passages.
//!
//! Each iteration renders a prompt (with feedback from earlier attempts), asks the
//! provider for a passage, and scores it. The loop stops at the first passage inside
//! the level's band. Otherwise it keeps the attempt closest to the band center and
//! returns that one when the budget runs out or the provider fails after at least one
//! scored attempt. A provider failure before any scored attempt is fatal.
//!
//! Iterations run strictly in sequence: every prompt depends on the previous result.

use tracing::{debug, info, instrument, warn};

use crate::domain::{Band, GeneratedPassage, Level};
use crate::error::{ProviderError, ProviderFailure};
use crate::prompts::build_primary_prompt;
use crate::providers::{ChatMessage, GenerateOptions, TextProvider};

/// Maps text to a readability score. `readability::gunning_fog` in production.
pub type Scorer = fn(&str) -> f64;

/// One scored provider response.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationAttempt {
  pub iteration: usize,
  pub prompt: String,
  pub text: String,
  pub score: f64,
  pub distance: f64,
}

/// Best passage seen so far.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
  pub text: String,
  pub score: f64,
  pub distance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
  /// Out of band; try again if budget remains.
  Continue,
  /// In band; stop with this attempt.
  Converged,
  /// Provider failed but a candidate exists; stop with it.
  Degraded,
}

/// How the loop ended. Logged; not part of the response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
  Converged,
  Exhausted,
  Degraded,
}

/// Working set for one calibration run. Allocated per request, never shared.
#[derive(Debug)]
pub struct CalibrationState {
  band: Band,
  best: Option<Candidate>,
  last_text: Option<String>,
  failed_texts: Vec<String>,
  prompts_used: Vec<String>,
  iterations: usize,
}

impl CalibrationState {
  pub fn new(level: Level) -> Self {
    Self {
      band: level.band(),
      best: None,
      last_text: None,
      failed_texts: Vec::new(),
      prompts_used: Vec::new(),
      iterations: 0,
    }
  }

  pub fn best_distance(&self) -> Option<f64> { self.best.as_ref().map(|c| c.distance) }

  /// Score to steer the next prompt with. `None` before the first scored attempt.
  pub fn prior_score(&self) -> Option<f64> { self.best.as_ref().map(|c| c.score) }

  /// Most recent text, kept whether or not it became the best.
  pub fn prior_text(&self) -> Option<&str> { self.last_text.as_deref() }

  /// Number of scored attempts.
  pub fn iterations(&self) -> usize { self.iterations }

  /// Prompts are recorded before the provider call, so failed calls keep theirs.
  pub fn record_prompt(&mut self, prompt: String) {
    self.prompts_used.push(prompt);
  }

  /// Build the attempt for text produced at the next iteration.
  pub fn attempt(&self, prompt: &str, text: String, score: f64) -> GenerationAttempt {
    GenerationAttempt {
      iteration: self.iterations + 1,
      prompt: prompt.to_string(),
      distance: self.band.distance_from_center(score),
      text,
      score,
    }
  }

  /// Fold a scored attempt into the state.
  pub fn absorb(&mut self, attempt: GenerationAttempt) -> Transition {
    self.iterations = attempt.iteration;
    self.last_text = Some(attempt.text.clone());

    if self.band.contains(attempt.score) {
      self.best = Some(Candidate { text: attempt.text, score: attempt.score, distance: attempt.distance });
      return Transition::Converged;
    }

    self.failed_texts.push(format!("Iteration {} (score {:.2}): {}", attempt.iteration, attempt.score, attempt.text));
    // Strict improvement only: ties keep the earlier candidate.
    if self.best_distance().map_or(true, |d| attempt.distance < d) {
      self.best = Some(Candidate { text: attempt.text, score: attempt.score, distance: attempt.distance });
    }
    Transition::Continue
  }

  /// A provider failure degrades to the best candidate, or is fatal without one.
  pub fn absorb_failure(&mut self, err: ProviderError) -> Result<Transition, ProviderError> {
    if self.best.is_some() { Ok(Transition::Degraded) } else { Err(err) }
  }

  /// Consume the state into the response. `None` only if nothing was ever scored.
  pub fn finish(self, level: Level, style: &str) -> Option<GeneratedPassage> {
    let best = self.best?;
    Some(GeneratedPassage {
      generated_text: best.text,
      score: Some(best.score),
      level,
      language: "English".into(),
      style: style.to_string(),
      iterations: self.iterations,
      failed_texts: self.failed_texts,
      prompts_used: self.prompts_used,
    })
  }
}

/// Drives `CalibrationState` against a provider.
pub struct Calibrator<'a> {
  provider: &'a dyn TextProvider,
  system_prompt: &'a str,
  max_iterations: usize,
  scorer: Scorer,
}

impl<'a> Calibrator<'a> {
  pub fn new(provider: &'a dyn TextProvider, system_prompt: &'a str, max_iterations: usize, scorer: Scorer) -> Self {
    Self { provider, system_prompt, max_iterations: max_iterations.max(1), scorer }
  }

  #[instrument(level = "info", skip(self, topic, level, style), fields(provider = self.provider.name(), model = %self.provider.model(), %level, topic_len = topic.len()))]
  pub async fn run(&self, topic: &str, level: Level, style: &str) -> Result<(GeneratedPassage, Termination), ProviderError> {
    let mut state = CalibrationState::new(level);
    let options = GenerateOptions::default();
    let mut termination = Termination::Exhausted;

    for i in 1..=self.max_iterations {
      let prompt = build_primary_prompt(topic, level, style, state.prior_score(), state.prior_text());
      state.record_prompt(prompt.clone());

      let messages = [ChatMessage::system(self.system_prompt), ChatMessage::user(prompt.as_str())];
      let text = match self.provider.generate(&messages, &options).await {
        Ok(c) => c.content,
        Err(e) => {
          warn!(target: "passage", iteration = i, error = %e, "Generation failed during calibration");
          state.absorb_failure(e)?;
          termination = Termination::Degraded;
          break;
        }
      };

      let score = (self.scorer)(&text);
      let attempt = state.attempt(&prompt, text, score);
      debug!(target: "passage", iteration = i, score, distance = attempt.distance, prompt_len = attempt.prompt.len(), "Attempt scored");

      if state.absorb(attempt) == Transition::Converged {
        termination = Termination::Converged;
        break;
      }
    }

    let iterations = state.iterations();
    // Every path here scored at least once; a fatal first failure returned above.
    let passage = state
      .finish(level, style)
      .ok_or_else(|| ProviderError::new(self.provider.name(), ProviderFailure::EmptyContent))?;
    info!(target: "passage", ?termination, iterations, score = ?passage.score, "Calibration finished");
    Ok((passage, termination))
  }
}
