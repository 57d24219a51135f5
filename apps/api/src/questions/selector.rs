//! Question selection: picks an ordered, duplicate-free question set for a
//! keyword list from the bank.
//!
//! Algorithm:
//! 1. per_keyword = ceil(max / keywords.len())
//! 2. For each keyword in order, take up to per_keyword unseen questions from
//!    its bank entry, stopping as soon as `max` is reached
//! 3. If fewer than `min` were found, fill up to `max` from the generic bucket
//!    in its fixed order, skipping anything already picked
//! 4. If the bank cannot supply `min` questions the shorter set is returned
//!    as-is; that is a degraded but valid outcome

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::questions::bank::QuestionBank;

pub const MIN_QUESTIONS: usize = 3;
pub const DEFAULT_MAX_QUESTIONS: usize = 5;

/// Where a question came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "keyword")]
pub enum QuestionSource {
    Keyword(String),
    Generic,
    Generated,
}

impl QuestionSource {
    /// Short tag for exports: the keyword, or "generic" / "generated".
    pub fn label(&self) -> &str {
        match self {
            QuestionSource::Keyword(keyword) => keyword,
            QuestionSource::Generic => "generic",
            QuestionSource::Generated => "generated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub source: QuestionSource,
}

/// Ordered questions for one session. Fixed once generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.questions.iter().map(|q| q.text.as_str()).collect()
    }
}

/// Selects from the process-wide bank.
pub fn select_questions(keywords: &[String], min: usize, max: usize) -> QuestionSet {
    select_from_bank(QuestionBank::global(), keywords, min, max)
}

pub fn select_from_bank(
    bank: &QuestionBank,
    keywords: &[String],
    min: usize,
    max: usize,
) -> QuestionSet {
    let max = max.max(min);
    let mut picked: Vec<Question> = Vec::with_capacity(max);
    let mut used: HashSet<&str> = HashSet::new();

    if !keywords.is_empty() {
        let per_keyword = max.div_ceil(keywords.len());

        'keywords: for keyword in keywords {
            if !bank.knows(keyword) {
                debug!("No bank questions for '{keyword}'");
                continue;
            }
            let mut taken = 0;
            for &text in bank.questions_for(keyword) {
                if picked.len() >= max {
                    break 'keywords;
                }
                if taken >= per_keyword {
                    break;
                }
                if !used.insert(text) {
                    continue;
                }
                picked.push(Question {
                    text: text.to_string(),
                    source: QuestionSource::Keyword(keyword.clone()),
                });
                taken += 1;
            }
        }
    }

    if picked.len() < min {
        for &text in bank.generic() {
            if picked.len() >= max {
                break;
            }
            if !used.insert(text) {
                continue;
            }
            picked.push(Question {
                text: text.to_string(),
                source: QuestionSource::Generic,
            });
        }
    }

    QuestionSet::new(picked)
}
