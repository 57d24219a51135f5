//! Generative backend contract and the per-session backend choice.
//!
//! A session is built with one `Backend` variant and never switches:
//! `Generative` wraps anything implementing `GenerativeBackend` (the
//! Anthropic client in production, mocks in tests); `RuleBased` never makes a
//! call. Every failure of the generative path (error, timeout, malformed
//! output) yields exactly what `RuleBased` would have produced.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::{question_generation_prompt, JSON_ONLY_SYSTEM};
use crate::llm_client::{ChatMessage, LlmClient, LlmError};
use crate::questions::selector::{select_questions, Question, QuestionSet, QuestionSource};

/// Generated questions longer than this are treated as malformed output.
const MAX_GENERATED_QUESTION_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed backend output: {0}")]
    Malformed(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Capability consumed from a generative language model.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_questions(
        &self,
        keywords: &[String],
        count: usize,
    ) -> Result<Vec<String>, BackendError>;

    async fn chat(&self, system: &str, history: &[ChatMessage]) -> Result<String, BackendError>;
}

#[async_trait]
impl GenerativeBackend for LlmClient {
    async fn generate_questions(
        &self,
        keywords: &[String],
        count: usize,
    ) -> Result<Vec<String>, BackendError> {
        let prompt = question_generation_prompt(keywords, count);
        let questions: Vec<String> = self.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
        Ok(questions)
    }

    async fn chat(&self, system: &str, history: &[ChatMessage]) -> Result<String, BackendError> {
        Ok(self.call_text(history, system).await?)
    }
}

#[derive(Clone)]
pub enum Backend {
    Generative(Arc<dyn GenerativeBackend>),
    RuleBased,
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Generative(_) => "generative",
            Backend::RuleBased => "rule_based",
        }
    }

    /// Builds the question set for `keywords`. Never fails: any problem on the
    /// generative path falls back to bank selection.
    pub async fn question_set(
        &self,
        keywords: &[String],
        min: usize,
        max: usize,
        timeout: Duration,
    ) -> QuestionSet {
        let Backend::Generative(backend) = self else {
            return select_questions(keywords, min, max);
        };

        let generated = match tokio::time::timeout(
            timeout,
            backend.generate_questions(keywords, max),
        )
        .await
        {
            Ok(Ok(raw)) => accept_generated(raw, min, max),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BackendError::Timeout(timeout)),
        };

        match generated {
            Ok(set) => {
                debug!("Using {} generated questions", set.len());
                set
            }
            Err(e) => {
                warn!("Question generation fell back to the bank: {e}");
                select_questions(keywords, min, max)
            }
        }
    }

    /// Free-form reply from the generative backend, or `None` when the rule
    /// based responder should answer instead.
    pub async fn reply(
        &self,
        system: &str,
        history: &[ChatMessage],
        timeout: Duration,
    ) -> Option<String> {
        let Backend::Generative(backend) = self else {
            return None;
        };

        match tokio::time::timeout(timeout, backend.chat(system, history)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(Ok(_)) => {
                warn!("Generative reply was empty; using rule-based reply");
                None
            }
            Ok(Err(e)) => {
                warn!("Generative reply failed; using rule-based reply: {e}");
                None
            }
            Err(_) => {
                warn!("Generative reply timed out after {timeout:?}; using rule-based reply");
                None
            }
        }
    }
}

/// All-or-nothing check of generated questions: count within [min, max], no
/// blank or oversized entries, no duplicates.
fn accept_generated(raw: Vec<String>, min: usize, max: usize) -> Result<QuestionSet, BackendError> {
    if !(min..=max).contains(&raw.len()) {
        return Err(BackendError::Malformed(format!(
            "expected {min}..={max} questions, got {}",
            raw.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raw.len());
    for text in raw {
        let text = text.trim().to_string();
        if text.is_empty() || text.chars().count() > MAX_GENERATED_QUESTION_CHARS {
            return Err(BackendError::Malformed(
                "blank or oversized question".to_string(),
            ));
        }
        if !seen.insert(text.to_lowercase()) {
            return Err(BackendError::Malformed(format!("duplicate question: {text}")));
        }
        questions.push(Question {
            text,
            source: QuestionSource::Generated,
        });
    }

    Ok(QuestionSet::new(questions))
}
