//! Rule-based responder. Every reply the engine sends is rendered here from
//! the session phase and what just happened in the turn; the generative
//! backend can only replace the off-topic scoping text.

use crate::conversation::engine::{Phase, MAX_INPUT_CHARS};
use crate::intake::fields::field_spec;
use crate::intake::validation::RejectionReason;
use crate::questions::selector::{Question, QuestionSet};

pub const GREETING: &str = "Hello! I'm TalentScout, your hiring assistant. I will collect your \
    basic details, understand your tech stack, and ask a few tailored technical questions. \
    You can type 'exit' anytime to end the conversation.";

pub const GENERATING: &str = "Thanks! Generating tailored technical questions based on your tech stack...";

pub const CLOSING: &str = "Thank you for your time. Our team will review your responses and \
    reach out with next steps.";

pub const ALREADY_ENDED: &str = "This conversation has ended. Please start a new session if \
    you'd like to begin again.";

const BACK_TO_INTERVIEW: &str = "Let's get back to the interview.";

fn too_long() -> String {
    format!("That message is too long. Please keep it under {MAX_INPUT_CHARS} characters.")
}

/// What the engine did with the current input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    SessionStarted,
    FieldAccepted,
    FieldRejected(RejectionReason),
    QuestionsReady,
    AnswerRecorded,
    OffTopic,
    InputTooLong,
    EndRequested,
    QuestionsCompleted,
    AlreadyEnded,
}

/// Snapshot handed to the responder after the engine applied the turn.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub phase: Phase,
    pub event: TurnEvent,
    pub input: &'a str,
    pub questions: &'a QuestionSet,
    pub tech_keywords: &'a [String],
    pub answered: usize,
}

pub struct FallbackResponder;

impl FallbackResponder {
    pub fn respond(ctx: &ResponseContext<'_>) -> String {
        match ctx.phase {
            Phase::Collecting { field_index } => Self::field_reply(field_index, ctx.event),
            Phase::GeneratingQuestions => GENERATING.to_string(),
            Phase::AwaitingAnswers { question_index } => Self::question_reply(ctx, question_index),
            Phase::Ended => Self::ended_reply(ctx),
        }
    }

    fn field_reply(field_index: usize, event: TurnEvent) -> String {
        let prompt = field_spec(field_index)
            .map(|spec| spec.prompt)
            .unwrap_or("Could you tell me a bit more?");

        match event {
            TurnEvent::SessionStarted => format!("{GREETING}\n\n{prompt}"),
            TurnEvent::FieldAccepted => format!("Thanks! {prompt}"),
            TurnEvent::FieldRejected(reason) => format!("{} {prompt}", reason.message()),
            TurnEvent::InputTooLong => format!("{} {prompt}", too_long()),
            _ => prompt.to_string(),
        }
    }

    fn question_reply(ctx: &ResponseContext<'_>, question_index: usize) -> String {
        let Some(question) = ctx.questions.get(question_index) else {
            return format!("{CLOSING}{}", Self::summary(ctx));
        };
        let asked = Self::format_question(question_index, question);

        match ctx.event {
            TurnEvent::QuestionsReady => format!(
                "Generating questions for your tech stack: {}. Please answer briefly.\n\n{asked}",
                ctx.tech_keywords.join(", ")
            ),
            TurnEvent::AnswerRecorded => {
                let remaining = ctx.questions.len() - question_index;
                format!("Noted. {remaining} question(s) remaining.\n\n{asked}")
            }
            TurnEvent::OffTopic => format!(
                "{}\n\n{}",
                Self::scoping_reply(ctx.input),
                Self::back_to_question(question_index, question)
            ),
            TurnEvent::InputTooLong => format!("{}\n\n{asked}", too_long()),
            _ => asked,
        }
    }

    fn ended_reply(ctx: &ResponseContext<'_>) -> String {
        match ctx.event {
            TurnEvent::EndRequested | TurnEvent::QuestionsCompleted => {
                format!("{CLOSING}{}", Self::summary(ctx))
            }
            _ => ALREADY_ENDED.to_string(),
        }
    }

    fn summary(ctx: &ResponseContext<'_>) -> String {
        if ctx.answered == 0 || ctx.questions.is_empty() {
            return String::new();
        }
        format!(
            " You answered {} of {} technical question(s).",
            ctx.answered,
            ctx.questions.len()
        )
    }

    pub fn format_question(index: usize, question: &Question) -> String {
        format!("Q{}. {}", index + 1, question.text)
    }

    /// Steering line that restates the open question.
    pub fn back_to_question(index: usize, question: &Question) -> String {
        format!("{BACK_TO_INTERVIEW} {}", Self::format_question(index, question))
    }

    /// Canned answers for common out-of-scope requests.
    pub fn scoping_reply(input: &str) -> &'static str {
        let lowered = input.to_lowercase();
        if ["salary", "ctc", "compensation"]
            .iter()
            .any(|w| lowered.contains(w))
        {
            return "Compensation details depend on the role and experience. A recruiter will follow up.";
        }
        if lowered.contains("interview") {
            return "We will schedule interviews based on your fit. Please ensure your details are complete.";
        }
        "I can assist with hiring and tech-screening questions only."
    }
}
