//! Gunning Fog readability index.
//!
//! `0.4 * (words / sentences + 100 * complex_words / words)`, rounded to two decimals.
//! A word is complex when it has three or more syllables once a trailing
//! `-es`, `-ed` or `-ing` is stripped. Syllables are counted as vowel groups,
//! which is the usual approximation for English and is not valid for other languages.

/// Score `text`. Empty or wordless text scores 0.0.
pub fn gunning_fog(text: &str) -> f64 {
  let words = words(text);
  if words.is_empty() {
    return 0.0;
  }
  let sentences = sentence_count(text).max(1) as f64;
  let total = words.len() as f64;
  let complex = words.iter().filter(|w| is_complex(w)).count() as f64;

  let grade = 0.4 * (total / sentences + 100.0 * complex / total);
  (grade * 100.0).round() / 100.0
}

fn words(text: &str) -> Vec<String> {
  text
    .split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '-'))
    .map(|w| w.trim_matches(|c| c == '\'' || c == '-'))
    .filter(|w| w.chars().any(char::is_alphabetic))
    .map(str::to_lowercase)
    .collect()
}

fn sentence_count(text: &str) -> usize {
  let mut count = 0;
  let mut open = false;
  for ch in text.chars() {
    if matches!(ch, '.' | '!' | '?') {
      if open { count += 1; }
      open = false;
    } else if ch.is_alphanumeric() {
      open = true;
    }
  }
  if open { count += 1; }
  count
}

fn is_complex(word: &str) -> bool {
  let stem = ["ing", "es", "ed"]
    .iter()
    .find_map(|suffix| word.strip_suffix(suffix).filter(|s| s.len() > 2))
    .unwrap_or(word);
  syllables(stem) >= 3
}

fn syllables(word: &str) -> usize {
  let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
  let chars: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();

  let mut groups = 0;
  let mut prev_vowel = false;
  for &c in &chars {
    let v = is_vowel(c);
    if v && !prev_vowel { groups += 1; }
    prev_vowel = v;
  }

  // silent trailing e ("make"), but not "-le" ("table")
  let n = chars.len();
  if n > 2 && chars[n - 1] == 'e' && !is_vowel(chars[n - 2]) && chars[n - 2] != 'l' && groups > 1 {
    groups -= 1;
  }
  groups.max(1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_text_scores_zero() {
    assert_eq!(gunning_fog(""), 0.0);
    assert_eq!(gunning_fog("  ...  "), 0.0);
  }

  #[test]
  fn short_plain_sentences_score_low() {
    // 6 words, 2 sentences, no complex words: 0.4 * 3
    assert_eq!(gunning_fog("The cat sat. The dog ran."), 1.2);
  }

  #[test]
  fn dense_vocabulary_scores_high() {
    let score = gunning_fog("Institutional reorganization necessitates comprehensive evaluation.");
    assert!(score > 25.0, "got {score}");
  }

  #[test]
  fn unterminated_trailing_sentence_counts() {
    assert_eq!(sentence_count("One two. Three four"), 2);
    assert_eq!(sentence_count("Wait... what?!"), 2);
  }

  #[test]
  fn syllable_heuristics() {
    assert_eq!(syllables("cat"), 1);
    assert_eq!(syllables("make"), 1);
    assert_eq!(syllables("table"), 2);
    assert_eq!(syllables("beautiful"), 3);
    assert!(!is_complex("created"));
    assert!(is_complex("evaluation"));
  }

  #[test]
  fn scoring_is_deterministic() {
    let text = "Volcanoes are openings in the crust. Hot rock comes out of them.";
    assert_eq!(gunning_fog(text), gunning_fog(text));
  }
}
