//! Domain models: difficulty levels with their readability bands, generated passages, and questions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Difficulty level requested by the learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
  Basic,
  Intermediate,
  Advanced,
}

impl Level {
  #[cfg(test)]
  pub const ALL: [Level; 3] = [Level::Basic, Level::Intermediate, Level::Advanced];

  /// Inclusive Gunning Fog band a passage must land in for this level.
  pub fn band(self) -> Band {
    match self {
      Level::Basic => Band { low: 0.0, high: 6.0 },
      Level::Intermediate => Band { low: 6.0, high: 12.0 },
      Level::Advanced => Band { low: 12.0, high: 25.0 },
    }
  }

  /// Advisory word count. The calibration loop never checks it.
  pub fn word_range(self) -> &'static str {
    match self {
      Level::Basic => "150-250",
      Level::Intermediate => "250-400",
      Level::Advanced => "400-600",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Level::Basic => "Basic",
      Level::Intermediate => "Intermediate",
      Level::Advanced => "Advanced",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Closed score interval `[low, high]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
  pub low: f64,
  pub high: f64,
}

impl Band {
  pub fn contains(&self, score: f64) -> bool {
    self.low <= score && score <= self.high
  }

  pub fn center(&self) -> f64 {
    (self.low + self.high) / 2.0
  }

  pub fn distance_from_center(&self, score: f64) -> f64 {
    (score - self.center()).abs()
  }
}

/// Final result of a passage request, English or not.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedPassage {
  pub generated_text: String,
  /// `None` on the single-shot path, which is never scored.
  pub score: Option<f64>,
  pub level: Level,
  pub language: String,
  pub style: String,
  pub iterations: usize,
  pub failed_texts: Vec<String>,
  pub prompts_used: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
  pub question: String,
  pub choices: Vec<String>,
  pub answer: String,
}

/// Shape the model is asked to emit: `{"questions": [...]}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionSet {
  pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bands_match_levels() {
    assert_eq!(Level::Basic.band(), Band { low: 0.0, high: 6.0 });
    assert_eq!(Level::Intermediate.band().center(), 9.0);
    assert_eq!(Level::Advanced.band().center(), 18.5);
  }

  #[test]
  fn band_bounds_are_inclusive() {
    let band = Level::Intermediate.band();
    assert!(band.contains(6.0));
    assert!(band.contains(12.0));
    assert!(!band.contains(12.01));
    assert!(!band.contains(5.99));
  }

  #[test]
  fn level_round_trips_through_json_names() {
    let lvl: Level = serde_json::from_str("\"Advanced\"").unwrap();
    assert_eq!(lvl, Level::Advanced);
    assert!(serde_json::from_str::<Level>("\"Expert\"").is_err());
  }
}
