//! Advisory sentiment labels for interview answers.
//!
//! Scoring is best-effort: the engine bounds each call with a short timeout
//! and stores no label when the scorer errors or is too slow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalization constant for the compound score, x / sqrt(x² + ALPHA).
const ALPHA: f64 = 15.0;
const POSITIVE_THRESHOLD: f64 = 0.2;
const NEGATIVE_THRESHOLD: f64 = -0.2;

/// Longer answers are left unlabelled.
const MAX_SCORED_CHARS: usize = 2000;

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "cant", "can't", "isnt", "isn't", "wasnt", "wasn't",
    "didnt", "didn't", "hardly",
];

const LEXICON: &[(&str, f64)] = &[
    ("love", 3.2),
    ("loved", 2.9),
    ("great", 3.1),
    ("excellent", 3.2),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("good", 1.9),
    ("happy", 2.7),
    ("confident", 2.2),
    ("excited", 2.2),
    ("proud", 2.1),
    ("success", 2.7),
    ("successful", 2.8),
    ("solved", 1.8),
    ("fun", 2.3),
    ("interesting", 1.7),
    ("like", 1.5),
    ("easy", 1.9),
    ("clean", 1.7),
    ("improved", 1.9),
    ("fast", 1.0),
    ("bad", -2.5),
    ("terrible", -2.5),
    ("awful", -2.0),
    ("hate", -2.7),
    ("hated", -3.2),
    ("difficult", -1.5),
    ("hard", -0.4),
    ("confusing", -1.3),
    ("frustrating", -2.1),
    ("frustrated", -2.0),
    ("painful", -2.4),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("problem", -1.7),
    ("slow", -1.0),
    ("unsure", -1.0),
    ("worried", -1.9),
    ("boring", -1.3),
    ("broken", -2.1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("sentiment scorer unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<SentimentLabel, SentimentError>;
}

/// Word-valence scorer with single-word negation flipping.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconSentimentScorer;

impl LexiconSentimentScorer {
    /// Compound score in [-1, 1].
    pub fn compound(text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let mut sum = 0.0;
        for (i, word) in words.iter().enumerate() {
            let Some(valence) = valence(word) else {
                continue;
            };
            let negated = i > 0 && NEGATIONS.contains(&words[i - 1]);
            sum += if negated { -0.74 * valence } else { valence };
        }

        if sum == 0.0 {
            return 0.0;
        }
        sum / (sum * sum + ALPHA).sqrt()
    }

    pub fn label(compound: f64) -> SentimentLabel {
        if compound >= POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

fn valence(word: &str) -> Option<f64> {
    LEXICON.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

#[async_trait]
impl SentimentScorer for LexiconSentimentScorer {
    async fn score(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        if text.chars().count() > MAX_SCORED_CHARS {
            return Err(SentimentError::Unavailable(format!(
                "answer longer than {MAX_SCORED_CHARS} characters"
            )));
        }
        Ok(Self::label(Self::compound(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_positive_answer() {
        let label = LexiconSentimentScorer
            .score("I love Rust, the tooling is great")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Positive);
    }

    #[tokio::test]
    async fn test_negative_answer() {
        let label = LexiconSentimentScorer
            .score("Honestly that migration was terrible and frustrating")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn test_neutral_answer() {
        let label = LexiconSentimentScorer
            .score("A tuple is immutable while a list can be modified")
            .await
            .unwrap();
        assert_eq!(label, SentimentLabel::Neutral);
    }

    #[tokio::test]
    async fn test_oversized_answer_is_not_scored() {
        let essay = "good ".repeat(500);
        let err = LexiconSentimentScorer.score(&essay).await.unwrap_err();
        assert!(matches!(err, SentimentError::Unavailable(_)));
    }

    #[test]
    fn test_negation_flips_valence() {
        assert!(LexiconSentimentScorer::compound("good") > 0.0);
        assert!(LexiconSentimentScorer::compound("not good") < 0.0);
    }

    #[test]
    fn test_compound_is_bounded() {
        let gushing = "great ".repeat(50);
        let c = LexiconSentimentScorer::compound(&gushing);
        assert!(c > 0.9 && c <= 1.0);
        assert_eq!(LexiconSentimentScorer::compound(""), 0.0);
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(LexiconSentimentScorer::label(0.2), SentimentLabel::Positive);
        assert_eq!(LexiconSentimentScorer::label(0.19), SentimentLabel::Neutral);
        assert_eq!(LexiconSentimentScorer::label(-0.2), SentimentLabel::Negative);
    }
}
