//! Conversation engine: the per-session state machine.
//!
//! ```text
//! Collecting(0) → … → Collecting(last) → GeneratingQuestions → AwaitingAnswers(0) → … → Ended
//!        └──────────────── end keyword from any phase ─────────────────────────────────┘
//! ```
//!
//! One engine owns one `SessionState` and is only mutated through
//! `handle_turn`, one input at a time. Nothing in a turn can fail it: field
//! rejections re-prompt, backend problems fall back to the bank and the rule
//! based responder, sentiment and storage failures are logged and dropped.
//!
//! Sentiment scoring and transcript saving run on spawned tasks and never
//! hold up a reply. Labels land in shared slots and are merged into
//! snapshots, answer rows and the saved transcript.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::conversation::end_detector::is_end_signal;
use crate::conversation::fallback::{FallbackResponder, ResponseContext, TurnEvent};
use crate::conversation::intent::{classify_intent, scope_keywords, Intent};
use crate::intake::fields::{field_spec, next_required_field};
use crate::intake::profile::CandidateProfile;
use crate::intake::validation::{validate, Validation};
use crate::llm_client::prompts::HIRING_ASSISTANT_SYSTEM;
use crate::llm_client::ChatMessage;
use crate::questions::backend::Backend;
use crate::questions::selector::{QuestionSet, DEFAULT_MAX_QUESTIONS, MIN_QUESTIONS};
use crate::sentiment::{SentimentLabel, SentimentScorer};
use crate::storage::{SessionTranscript, TranscriptStore};

/// Turns of history sent with a generative reply.
const CHAT_HISTORY_TURNS: usize = 10;

/// Longest message the engine acts on. Longer input is re-prompted.
pub const MAX_INPUT_CHARS: usize = 4000;

/// Background sentiment labels, indexed like `SessionState::answers`.
type SentimentSlots = Arc<Mutex<Vec<Option<SentimentLabel>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Phase {
    Collecting { field_index: usize },
    GeneratingQuestions,
    AwaitingAnswers { question_index: usize },
    Ended,
}

impl Phase {
    pub fn is_ended(&self) -> bool {
        matches!(self, Phase::Ended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_index: usize,
    pub text: String,
    pub sentiment: Option<SentimentLabel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub phase: Phase,
    /// Every phase entered, in order, starting with `Collecting(0)`.
    pub phase_history: Vec<Phase>,
    pub profile: CandidateProfile,
    pub questions: QuestionSet,
    pub answers: Vec<Answer>,
    pub turn_history: Vec<Turn>,
    pub consent: bool,
    pub started_at: DateTime<Utc>,
}

/// One line of the Q&A export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRow {
    pub index: usize,
    pub tech: String,
    pub question: String,
    pub answer: String,
    pub sentiment: Option<SentimentLabel>,
}

/// Result of one turn as seen by the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResponse {
    pub response_text: String,
    pub phase: Phase,
    pub is_ended: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub min_questions: usize,
    pub max_questions: usize,
    pub backend_timeout: Duration,
    pub sentiment_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_questions: MIN_QUESTIONS,
            max_questions: DEFAULT_MAX_QUESTIONS,
            backend_timeout: Duration::from_secs(20),
            sentiment_timeout: Duration::from_millis(250),
        }
    }
}

/// Shared services every engine is built with. Cloned per session.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Backend,
    pub sentiment: Arc<dyn SentimentScorer>,
    pub store: Arc<dyn TranscriptStore>,
    pub settings: EngineSettings,
}

pub struct ConversationEngine {
    state: SessionState,
    deps: Collaborators,
    sentiment: SentimentSlots,
    scoring: Vec<JoinHandle<()>>,
    #[cfg_attr(not(test), allow(dead_code))]
    saving: Option<JoinHandle<()>>,
    last_activity: Instant,
}

impl ConversationEngine {
    pub fn new(session_id: Uuid, consent: bool, deps: Collaborators) -> Self {
        let phase = Phase::Collecting { field_index: 0 };
        Self {
            state: SessionState {
                session_id,
                phase,
                phase_history: vec![phase],
                profile: CandidateProfile::default(),
                questions: QuestionSet::default(),
                answers: Vec::new(),
                turn_history: Vec::new(),
                consent,
                started_at: Utc::now(),
            },
            deps,
            sentiment: Arc::new(Mutex::new(Vec::new())),
            scoring: Vec::new(),
            saving: None,
            last_activity: Instant::now(),
        }
    }

    /// Live state. Answer sentiment here is only what was known when the
    /// answer was recorded; use `snapshot` for merged labels.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionState {
        let mut state = self.state.clone();
        fill_sentiment(&mut state.answers, &self.sentiment);
        state
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn answer_rows(&self) -> Vec<AnswerRow> {
        let mut answers = self.state.answers.clone();
        fill_sentiment(&mut answers, &self.sentiment);
        answers
            .into_iter()
            .filter_map(|answer| {
                let question = self.state.questions.get(answer.question_index)?;
                Some(AnswerRow {
                    index: answer.question_index + 1,
                    tech: question.source.label().to_string(),
                    question: question.text.clone(),
                    answer: answer.text,
                    sentiment: answer.sentiment,
                })
            })
            .collect()
    }

    pub fn set_consent(&mut self, consent: bool) {
        self.state.consent = consent;
    }

    /// Opening message: greeting plus the first field prompt.
    pub fn start(&mut self) -> String {
        let greeting = self.render(TurnEvent::SessionStarted, "");
        self.push_turn(Speaker::Assistant, &greeting);
        greeting
    }

    pub async fn handle_turn(&mut self, text: &str) -> TurnResponse {
        self.last_activity = Instant::now();
        let was_ended = self.state.phase.is_ended();
        let too_long = text.chars().count() > MAX_INPUT_CHARS;
        if too_long {
            let kept: String = text.chars().take(MAX_INPUT_CHARS).collect();
            self.push_turn(Speaker::User, &kept);
        } else {
            self.push_turn(Speaker::User, text);
        }

        let reply = match self.state.phase {
            Phase::Ended => self.render(TurnEvent::AlreadyEnded, text),
            _ if too_long => {
                debug!(session_id = %self.state.session_id, "Input too long; re-prompting");
                self.render(TurnEvent::InputTooLong, "")
            }
            _ if is_end_signal(text) => {
                debug!(session_id = %self.state.session_id, "End keyword received");
                self.finish(TurnEvent::EndRequested, text)
            }
            Phase::Collecting { field_index } => self.collect(field_index, text).await,
            Phase::GeneratingQuestions => self.start_questions(text).await,
            Phase::AwaitingAnswers { question_index } => self.answer(question_index, text).await,
        };

        self.push_turn(Speaker::Assistant, &reply);

        if !was_ended && self.state.phase.is_ended() {
            self.on_ended();
        }

        TurnResponse {
            response_text: reply,
            phase: self.state.phase,
            is_ended: self.state.phase.is_ended(),
        }
    }

    async fn collect(&mut self, field_index: usize, text: &str) -> String {
        let Some(spec) = field_spec(field_index) else {
            return self.start_questions(text).await;
        };

        match validate(spec.id, text) {
            Validation::Accepted(value) => {
                self.state.profile.record(spec.id, value);
                debug!(session_id = %self.state.session_id, field = ?spec.id, "Field accepted");

                match next_required_field(&self.state.profile) {
                    Some(next) => {
                        self.transition(Phase::Collecting { field_index: next });
                        self.render(TurnEvent::FieldAccepted, text)
                    }
                    None => self.start_questions(text).await,
                }
            }
            Validation::Rejected(reason) => {
                debug!(
                    session_id = %self.state.session_id,
                    field = ?spec.id,
                    reason = reason.code(),
                    "Field rejected"
                );
                self.render(TurnEvent::FieldRejected(reason), text)
            }
        }
    }

    async fn start_questions(&mut self, text: &str) -> String {
        self.transition(Phase::GeneratingQuestions);

        if self.state.questions.is_empty() {
            let settings = self.deps.settings;
            let keywords = self.state.profile.tech_keywords().to_vec();
            self.state.questions = self
                .deps
                .backend
                .question_set(
                    &keywords,
                    settings.min_questions,
                    settings.max_questions,
                    settings.backend_timeout,
                )
                .await;
            info!(
                session_id = %self.state.session_id,
                backend = self.deps.backend.kind(),
                count = self.state.questions.len(),
                "Question set ready"
            );
        }

        if self.state.questions.is_empty() {
            return self.finish(TurnEvent::QuestionsCompleted, text);
        }

        self.transition(Phase::AwaitingAnswers { question_index: 0 });
        self.render(TurnEvent::QuestionsReady, text)
    }

    async fn answer(&mut self, question_index: usize, text: &str) -> String {
        let Some(question) = self.state.questions.get(question_index).cloned() else {
            return self.finish(TurnEvent::QuestionsCompleted, text);
        };

        let scope = scope_keywords(self.state.profile.tech_keywords(), &question.text);
        if classify_intent(text, &scope) == Intent::OffTopic {
            debug!(session_id = %self.state.session_id, question_index, "Off-topic answer");
            let history = self.chat_history();
            return match self
                .deps
                .backend
                .reply(
                    HIRING_ASSISTANT_SYSTEM,
                    &history,
                    self.deps.settings.backend_timeout,
                )
                .await
            {
                Some(reply) => format!(
                    "{reply}\n\n{}",
                    FallbackResponder::back_to_question(question_index, &question)
                ),
                None => self.render(TurnEvent::OffTopic, text),
            };
        }

        let answer_index = self.state.answers.len();
        self.state.answers.push(Answer {
            question_index,
            text: text.trim().to_string(),
            sentiment: None,
        });
        self.spawn_sentiment(answer_index, text);

        let next = question_index + 1;
        if next >= self.state.questions.len() {
            return self.finish(TurnEvent::QuestionsCompleted, text);
        }

        self.transition(Phase::AwaitingAnswers {
            question_index: next,
        });
        self.render(TurnEvent::AnswerRecorded, text)
    }

    fn finish(&mut self, event: TurnEvent, text: &str) -> String {
        self.transition(Phase::Ended);
        self.render(event, text)
    }

    fn on_ended(&mut self) {
        info!(
            session_id = %self.state.session_id,
            answered = self.state.answers.len(),
            questions = self.state.questions.len(),
            "Session ended"
        );

        if !self.state.consent {
            return;
        }

        let pending = std::mem::take(&mut self.scoring);
        let slots = Arc::clone(&self.sentiment);
        let store = Arc::clone(&self.deps.store);
        let mut transcript = self.transcript();
        let session_id = self.state.session_id;

        self.saving = Some(tokio::spawn(async move {
            // Each scoring task is bounded by the sentiment timeout.
            for handle in pending {
                let _ = handle.await;
            }
            fill_sentiment(&mut transcript.answers, &slots);

            if let Err(e) = store.save(&transcript).await {
                warn!(%session_id, "Failed to save transcript: {e}");
            }
        }));
    }

    fn spawn_sentiment(&mut self, answer_index: usize, text: &str) {
        let scorer = Arc::clone(&self.deps.sentiment);
        let slots = Arc::clone(&self.sentiment);
        let timeout = self.deps.settings.sentiment_timeout;
        let session_id = self.state.session_id;
        let text = text.to_string();

        self.scoring.retain(|handle| !handle.is_finished());
        self.scoring.push(tokio::spawn(async move {
            let label = match tokio::time::timeout(timeout, scorer.score(&text)).await {
                Ok(Ok(label)) => label,
                Ok(Err(e)) => {
                    debug!(%session_id, "Sentiment scoring failed: {e}");
                    return;
                }
                Err(_) => {
                    debug!(%session_id, "Sentiment scoring exceeded {timeout:?}");
                    return;
                }
            };

            if let Ok(mut slots) = slots.lock() {
                if slots.len() <= answer_index {
                    slots.resize(answer_index + 1, None);
                }
                slots[answer_index] = Some(label);
            }
        }));
    }

    /// Waits for background scoring and the transcript save to finish.
    #[cfg(test)]
    pub async fn settle(&mut self) {
        for handle in std::mem::take(&mut self.scoring) {
            let _ = handle.await;
        }
        if let Some(handle) = self.saving.take() {
            let _ = handle.await;
        }
    }

    fn transition(&mut self, phase: Phase) {
        debug!(
            session_id = %self.state.session_id,
            from = ?self.state.phase,
            to = ?phase,
            "Phase transition"
        );
        self.state.phase = phase;
        self.state.phase_history.push(phase);
    }

    fn render(&self, event: TurnEvent, input: &str) -> String {
        FallbackResponder::respond(&ResponseContext {
            phase: self.state.phase,
            event,
            input,
            questions: &self.state.questions,
            tech_keywords: self.state.profile.tech_keywords(),
            answered: self.state.answers.len(),
        })
    }

    fn push_turn(&mut self, speaker: Speaker, text: &str) {
        self.state.turn_history.push(Turn {
            speaker,
            text: text.to_string(),
        });
    }

    /// Recent turns as Messages API history: starts with a user message and
    /// merges consecutive messages from the same speaker.
    fn chat_history(&self) -> Vec<ChatMessage> {
        let start = self
            .state
            .turn_history
            .len()
            .saturating_sub(CHAT_HISTORY_TURNS);

        let mut messages: Vec<ChatMessage> = Vec::new();
        for turn in &self.state.turn_history[start..] {
            let role = match turn.speaker {
                Speaker::User => "user",
                Speaker::Assistant => "assistant",
            };
            if messages.is_empty() && role == "assistant" {
                continue;
            }
            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&turn.text);
                }
                _ => messages.push(match turn.speaker {
                    Speaker::User => ChatMessage::user(turn.text.clone()),
                    Speaker::Assistant => ChatMessage::assistant(turn.text.clone()),
                }),
            }
        }
        messages
    }

    pub fn transcript(&self) -> SessionTranscript {
        let mut answers = self.state.answers.clone();
        fill_sentiment(&mut answers, &self.sentiment);
        SessionTranscript {
            id: self.state.session_id,
            ts: Utc::now().timestamp(),
            profile: self.state.profile.clone(),
            messages: self.state.turn_history.clone(),
            questions: self.state.questions.iter().cloned().collect(),
            answers,
        }
    }
}

fn fill_sentiment(answers: &mut [Answer], slots: &SentimentSlots) {
    let Ok(slots) = slots.lock() else {
        return;
    };
    for (answer, label) in answers.iter_mut().zip(slots.iter()) {
        if answer.sentiment.is_none() {
            answer.sentiment = *label;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::fallback::{ALREADY_ENDED, CLOSING};
    use crate::intake::fields::FIELD_SPECS;
    use crate::intake::validation::RejectionReason;
    use crate::questions::backend::testing::MockBackend;
    use crate::questions::selector::{select_questions, QuestionSource};
    use crate::sentiment::{LexiconSentimentScorer, SentimentError};
    use crate::storage::testing::MemoryStore;
    use async_trait::async_trait;

    const VALID_FIELDS: [&str; 7] = [
        "Jane Doe",
        "jane@x.com",
        "+1-555-0100",
        "3",
        "Backend Engineer",
        "Remote",
        "Python and Go",
    ];

    struct SlowScorer;

    #[async_trait]
    impl SentimentScorer for SlowScorer {
        async fn score(&self, _text: &str) -> Result<SentimentLabel, SentimentError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(SentimentLabel::Positive)
        }
    }

    struct BrokenScorer;

    #[async_trait]
    impl SentimentScorer for BrokenScorer {
        async fn score(&self, _text: &str) -> Result<SentimentLabel, SentimentError> {
            Err(SentimentError::Unavailable("no lexicon".into()))
        }
    }

    fn deps(backend: Backend, store: Arc<MemoryStore>) -> Collaborators {
        Collaborators {
            backend,
            sentiment: Arc::new(LexiconSentimentScorer),
            store,
            settings: EngineSettings::default(),
        }
    }

    fn engine(consent: bool) -> (ConversationEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let mut engine =
            ConversationEngine::new(Uuid::new_v4(), consent, deps(Backend::RuleBased, store.clone()));
        engine.start();
        (engine, store)
    }

    async fn collect_all(engine: &mut ConversationEngine) -> TurnResponse {
        let mut last = None;
        for input in VALID_FIELDS {
            last = Some(engine.handle_turn(input).await);
        }
        last.unwrap()
    }

    #[tokio::test]
    async fn test_scenario_collects_fields_then_exits_early() {
        let (mut engine, _) = engine(false);

        for (i, input) in VALID_FIELDS.iter().enumerate() {
            let before = engine.state().phase;
            assert_eq!(before, Phase::Collecting { field_index: i });
            let response = engine.handle_turn(input).await;
            assert!(!response.is_ended);
            if i + 1 < VALID_FIELDS.len() {
                assert_eq!(response.phase, Phase::Collecting { field_index: i + 1 });
                assert_eq!(
                    response.response_text,
                    format!("Thanks! {}", FIELD_SPECS[i + 1].prompt)
                );
            } else {
                assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 0 });
                assert!(response.response_text.contains("python, go"));
                assert!(response.response_text.contains("Q1. "));
            }
        }

        let response = engine.handle_turn("exit").await;
        assert!(response.is_ended);
        assert_eq!(response.phase, Phase::Ended);
        assert_eq!(response.response_text, CLOSING);

        let state = engine.state();
        let mut expected: Vec<Phase> = (0..FIELD_SPECS.len())
            .map(|field_index| Phase::Collecting { field_index })
            .collect();
        expected.extend([
            Phase::GeneratingQuestions,
            Phase::AwaitingAnswers { question_index: 0 },
            Phase::Ended,
        ]);
        assert_eq!(state.phase_history, expected);
        assert!(state.answers.is_empty());
        assert_eq!(state.questions.len(), 5);
        assert_eq!(state.profile.email.as_deref(), Some("jane@x.com"));
        assert_eq!(state.profile.phone.as_deref(), Some("+15550100"));
        assert_eq!(state.profile.years_experience, Some(3.0));
        assert_eq!(
            state.profile.tech_stack,
            Some(vec!["python".to_string(), "go".to_string()])
        );
    }

    #[tokio::test]
    async fn test_invalid_input_keeps_field_and_reprompts() {
        let (mut engine, _) = engine(false);
        engine.handle_turn("Jane Doe").await;

        for _ in 0..3 {
            let response = engine.handle_turn("jane at example").await;
            assert_eq!(response.phase, Phase::Collecting { field_index: 1 });
            assert_eq!(
                response.response_text,
                format!(
                    "{} {}",
                    RejectionReason::InvalidEmailFormat.message(),
                    FIELD_SPECS[1].prompt
                )
            );
        }
        assert!(engine.state().profile.email.is_none());

        let response = engine.handle_turn("jane@example.com").await;
        assert_eq!(response.phase, Phase::Collecting { field_index: 2 });
    }

    #[tokio::test]
    async fn test_each_rejection_reprompts_its_own_field() {
        let cases = [
            (0, "   ", RejectionReason::EmptyName),
            (2, "call me", RejectionReason::InvalidPhoneFormat),
            (3, "lots", RejectionReason::NotANumber),
            (3, "75", RejectionReason::InvalidExperienceRange),
            (6, "...", RejectionReason::NoRecognizedTechnology),
        ];
        for (field_index, bad, reason) in cases {
            let (mut engine, _) = engine(false);
            for input in &VALID_FIELDS[..field_index] {
                engine.handle_turn(input).await;
            }
            let response = engine.handle_turn(bad).await;
            assert_eq!(response.phase, Phase::Collecting { field_index });
            assert!(response.response_text.starts_with(reason.message()));
            assert!(response.response_text.ends_with(FIELD_SPECS[field_index].prompt));
        }
    }

    #[tokio::test]
    async fn test_exit_during_collection_ends_immediately() {
        let (mut engine, _) = engine(false);
        engine.handle_turn("Jane Doe").await;

        let response = engine.handle_turn("  Goodbye ").await;
        assert!(response.is_ended);
        assert!(engine.state().questions.is_empty());
        assert_eq!(
            engine.state().phase_history.last(),
            Some(&Phase::Ended)
        );
    }

    #[tokio::test]
    async fn test_ended_is_terminal() {
        let (mut engine, _) = engine(false);
        engine.handle_turn("quit").await;
        let history_len = engine.state().phase_history.len();

        for input in ["Jane Doe", "exit", ""] {
            let response = engine.handle_turn(input).await;
            assert_eq!(response.response_text, ALREADY_ENDED);
            assert_eq!(response.phase, Phase::Ended);
        }
        assert_eq!(engine.state().phase_history.len(), history_len);
        assert!(engine.state().profile.full_name.is_none());
    }

    #[tokio::test]
    async fn test_answering_every_question_ends_session() {
        let (mut engine, store) = engine(true);
        collect_all(&mut engine).await;
        let total = engine.state().questions.len();

        for i in 0..total {
            let response = engine
                .handle_turn("I love this topic, we used it in production code")
                .await;
            if i + 1 < total {
                assert_eq!(
                    response.phase,
                    Phase::AwaitingAnswers { question_index: i + 1 }
                );
                assert!(response.response_text.starts_with(&format!(
                    "Noted. {} question(s) remaining.",
                    total - i - 1
                )));
            } else {
                assert!(response.is_ended);
                assert_eq!(
                    response.response_text,
                    format!("{CLOSING} You answered {total} of {total} technical question(s).")
                );
            }
        }

        engine.settle().await;
        let state = engine.snapshot();
        assert_eq!(state.answers.len(), total);
        assert!(state
            .answers
            .iter()
            .all(|a| a.sentiment == Some(SentimentLabel::Positive)));
        assert_eq!(store.saved_count(), 1);

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved[0].answers.len(), total);
        assert!(saved[0]
            .answers
            .iter()
            .all(|a| a.sentiment == Some(SentimentLabel::Positive)));
        assert_eq!(saved[0].questions.len(), total);
        assert_eq!(saved[0].messages.last().map(|t| t.speaker), Some(Speaker::Assistant));
    }

    #[tokio::test]
    async fn test_short_acknowledgement_counts_as_answer() {
        let (mut engine, _) = engine(false);
        collect_all(&mut engine).await;
        let response = engine.handle_turn("not sure").await;
        assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 1 });
        assert_eq!(engine.state().answers[0].text, "not sure");
    }

    #[tokio::test]
    async fn test_on_topic_answer_mentioning_pay_advances() {
        let (mut engine, _) = engine(false);
        collect_all(&mut engine).await;

        let response = engine
            .handle_turn("Tuples are immutable so you pay less memory than a python list")
            .await;
        assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 1 });
        assert!(response.response_text.starts_with("Noted."));
        assert_eq!(engine.state().answers.len(), 1);
        assert_eq!(engine.state().answers[0].question_index, 0);
    }

    #[tokio::test]
    async fn test_off_topic_answer_does_not_advance() {
        let (mut engine, _) = engine(false);
        collect_all(&mut engine).await;

        let response = engine.handle_turn("What salary would this role pay?").await;
        assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 0 });
        assert!(response.response_text.starts_with("Compensation details"));
        assert!(response
            .response_text
            .contains("Let's get back to the interview. Q1. "));
        assert!(engine.state().answers.is_empty());
    }

    #[tokio::test]
    async fn test_off_topic_uses_generative_reply_when_available() {
        let store = Arc::new(MemoryStore::default());
        let mock = Arc::new(MockBackend::answering(
            &["Q one?", "Q two?", "Q three?"],
            "I'm here to help with your screening.",
        ));
        let mut engine = ConversationEngine::new(
            Uuid::new_v4(),
            false,
            deps(Backend::Generative(mock.clone()), store),
        );
        engine.start();
        collect_all(&mut engine).await;
        assert_eq!(engine.state().questions.texts(), vec!["Q one?", "Q two?", "Q three?"]);

        let response = engine.handle_turn("Tell me a joke about cats").await;
        assert_eq!(
            response.response_text,
            "I'm here to help with your screening.\n\nLet's get back to the interview. Q1. Q one?"
        );
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_backend_matches_rule_based_session() {
        let store = Arc::new(MemoryStore::default());
        let mut generative = ConversationEngine::new(
            Uuid::new_v4(),
            false,
            deps(Backend::Generative(Arc::new(MockBackend::failing())), store),
        );
        let (mut rule_based, _) = engine(false);
        generative.start();

        let a = collect_all(&mut generative).await;
        let b = collect_all(&mut rule_based).await;
        assert_eq!(a, b);
        assert_eq!(generative.state().questions, rule_based.state().questions);
        assert_eq!(
            generative.state().questions,
            select_questions(&["python".to_string(), "go".to_string()], 3, 5)
        );
        assert!(generative
            .state()
            .questions
            .iter()
            .all(|q| matches!(q.source, QuestionSource::Keyword(_))));

        let a = generative.handle_turn("what's the weather like?").await;
        let b = rule_based.handle_turn("what's the weather like?").await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_no_transcript_without_consent() {
        let (mut engine, store) = engine(false);
        engine.handle_turn("exit").await;
        engine.settle().await;
        assert_eq!(store.saved_count(), 0);
    }

    #[tokio::test]
    async fn test_consent_granted_mid_session_is_honored() {
        let (mut engine, store) = engine(false);
        engine.handle_turn("Jane Doe").await;
        engine.set_consent(true);
        engine.handle_turn("bye").await;
        engine.settle().await;
        assert_eq!(store.saved_count(), 1);
        assert_eq!(
            store.saved.lock().unwrap()[0].profile.full_name.as_deref(),
            Some("Jane Doe")
        );
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_change_reply() {
        let store = Arc::new(MemoryStore::failing());
        let mut engine =
            ConversationEngine::new(Uuid::new_v4(), true, deps(Backend::RuleBased, store.clone()));
        engine.start();
        let response = engine.handle_turn("exit").await;
        assert!(response.is_ended);
        assert_eq!(response.response_text, CLOSING);
        engine.settle().await;
        assert_eq!(store.saved_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_sentiment_does_not_block_answer() {
        let store = Arc::new(MemoryStore::default());
        let mut engine = ConversationEngine::new(
            Uuid::new_v4(),
            false,
            Collaborators {
                sentiment: Arc::new(SlowScorer),
                ..deps(Backend::RuleBased, store)
            },
        );
        engine.start();
        collect_all(&mut engine).await;

        let started = std::time::Instant::now();
        let response = engine.handle_turn("yes").await;
        assert!(started.elapsed() < Duration::from_millis(100), "{:?}", started.elapsed());
        assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 1 });
        assert_eq!(engine.snapshot().answers[0].sentiment, None);

        engine.settle().await;
        assert_eq!(engine.snapshot().answers[0].sentiment, None);
    }

    #[tokio::test]
    async fn test_sentiment_label_arrives_after_reply() {
        let (mut engine, _) = engine(false);
        collect_all(&mut engine).await;

        engine.handle_turn("I love tuples, they are great for memory").await;
        assert_eq!(engine.state().answers[0].sentiment, None);

        engine.settle().await;
        assert_eq!(
            engine.snapshot().answers[0].sentiment,
            Some(SentimentLabel::Positive)
        );
        assert_eq!(
            engine.answer_rows()[0].sentiment,
            Some(SentimentLabel::Positive)
        );
    }

    #[tokio::test]
    async fn test_answer_rows_pair_questions_with_answers() {
        let (mut engine, _) = engine(false);
        collect_all(&mut engine).await;
        engine.handle_turn("Lists are mutable, tuples are not").await;
        engine.handle_turn("What salary would this role pay?").await;
        engine.handle_turn("Goroutines are multiplexed onto threads").await;
        engine.settle().await;

        let rows = engine.answer_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].tech, "python");
        assert_eq!(rows[0].question, engine.state().questions.get(0).unwrap().text);
        assert_eq!(rows[0].answer, "Lists are mutable, tuples are not");
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].answer, "Goroutines are multiplexed onto threads");
    }

    #[tokio::test]
    async fn test_too_long_input_reprompts_without_advancing() {
        let (mut engine, _) = engine(false);
        let long = "a".repeat(MAX_INPUT_CHARS + 1);

        let response = engine.handle_turn(&long).await;
        assert_eq!(response.phase, Phase::Collecting { field_index: 0 });
        assert!(response.response_text.starts_with("That message is too long."));
        assert!(response.response_text.ends_with(FIELD_SPECS[0].prompt));
        assert!(engine.state().profile.full_name.is_none());
        let stored = &engine.state().turn_history[1];
        assert_eq!(stored.text.chars().count(), MAX_INPUT_CHARS);

        collect_all(&mut engine).await;
        let response = engine.handle_turn(&format!("python {long}")).await;
        assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 0 });
        assert!(response.response_text.ends_with("Q1. Explain list vs tuple and when to use each."));
        assert!(engine.state().answers.is_empty());
    }

    #[tokio::test]
    async fn test_exact_limit_is_accepted() {
        let (mut engine, _) = engine(false);
        let name = format!("Jane {}", "a".repeat(MAX_INPUT_CHARS - 5));
        let response = engine.handle_turn(&name).await;
        assert!(!response.response_text.starts_with("That message is too long."));
    }

    #[tokio::test]
    async fn test_broken_sentiment_is_ignored() {
        let store = Arc::new(MemoryStore::default());
        let mut engine = ConversationEngine::new(
            Uuid::new_v4(),
            false,
            Collaborators {
                sentiment: Arc::new(BrokenScorer),
                ..deps(Backend::RuleBased, store)
            },
        );
        engine.start();
        collect_all(&mut engine).await;

        let response = engine.handle_turn("ok").await;
        assert_eq!(response.phase, Phase::AwaitingAnswers { question_index: 1 });
        engine.settle().await;
        assert_eq!(engine.snapshot().answers[0].sentiment, None);
    }

    #[tokio::test]
    async fn test_history_records_both_speakers() {
        let (mut engine, _) = engine(false);
        engine.handle_turn("Jane Doe").await;
        let history = &engine.state().turn_history;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].speaker, Speaker::Assistant);
        assert_eq!(history[1], Turn { speaker: Speaker::User, text: "Jane Doe".into() });
        assert_eq!(history[2].speaker, Speaker::Assistant);
    }

    #[tokio::test]
    async fn test_chat_history_starts_with_user_and_alternates() {
        let (mut engine, _) = engine(false);
        collect_all(&mut engine).await;
        let history = engine.chat_history();
        assert!(!history.is_empty());
        assert_eq!(history[0].role, "user");
        for pair in history.windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_value(Phase::AwaitingAnswers { question_index: 2 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "awaiting_answers", "question_index": 2})
        );
        let json = serde_json::to_value(Phase::Ended).unwrap();
        assert_eq!(json, serde_json::json!({"name": "ended"}));
    }
}
