//! Intent heuristics for answers given while questions are being asked.
//!
//! Rules, applied in order:
//! 1. `ShortAck`: every token is an acknowledgement word (yes/no/ok...), or
//!    the answer is a single short technical token ("O(1)", "mutex")
//! 2. `OnTopic`: references a scope keyword, i.e. the candidate's stack, a
//!    content word of the current question, or general engineering vocabulary
//! 3. `OffTopic`: everything else, including asides about pay or the weather
//!    that mention nothing in scope

use serde::{Deserialize, Serialize};

const ACK_WORDS: &[&str] = &[
    "yes", "y", "yeah", "yep", "no", "n", "nope", "ok", "okay", "sure", "maybe", "idk", "not",
    "thanks", "thank", "you",
];

const MAX_SHORT_TOKEN_CHARS: usize = 24;

/// Words that make an answer technical regardless of the current question.
const ENGINEERING_VOCABULARY: &[&str] = &[
    "code", "coding", "system", "design", "bug", "debug", "test", "testing", "data", "performance",
    "memory", "thread", "threads", "concurrency", "async", "function", "method", "class",
    "object", "api", "database", "query", "index", "cache", "server", "client", "deploy",
    "deployment", "production", "scale", "scaling", "latency", "error", "exception", "loop",
    "variable", "type", "types", "example", "library", "framework", "module", "service",
    "request", "response", "state", "immutable", "mutable", "runtime", "compile", "compiler",
    "algorithm", "complexity", "architecture", "pipeline", "container", "model", "schema",
    "transaction", "lock", "queue", "event", "callback", "interface", "pattern", "refactor",
    "review", "monitoring", "logging", "metrics", "version", "git", "project", "team",
    "experience", "implement", "implemented", "built", "used", "because",
];

/// Question words too common to signal topic.
const STOP_WORDS: &[&str] = &[
    "what", "when", "where", "which", "while", "with", "would", "your", "that", "this", "there",
    "their", "them", "they", "does", "have", "from", "into", "each", "some", "show", "simple",
    "explain", "describe", "difference", "between", "use-case", "practical", "help", "helps",
    "work", "works", "about", "over", "under", "tell",
];

const MIN_SCOPE_WORD_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OnTopic,
    OffTopic,
    ShortAck,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Folds a plural onto its singular: "generators" → "generator".
fn stem(word: &str) -> &str {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        &word[..word.len() - 1]
    } else {
        word
    }
}

pub fn is_short_ack(tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    if tokens.iter().all(|t| ACK_WORDS.contains(&t.as_str())) {
        return true;
    }
    tokens.len() == 1 && tokens[0].chars().count() <= MAX_SHORT_TOKEN_CHARS
}

pub fn references_scope(tokens: &[String], scope: &[String]) -> bool {
    tokens.iter().any(|token| {
        let token = stem(token);
        scope.iter().any(|s| stem(s) == token)
            || ENGINEERING_VOCABULARY.iter().any(|v| stem(v) == token)
    })
}

/// Scope keywords for one question: the candidate's normalized stack plus the
/// content words of the question text.
pub fn scope_keywords(tech_keywords: &[String], question: &str) -> Vec<String> {
    let mut scope: Vec<String> = tech_keywords.to_vec();
    for word in tokenize(question) {
        if word.chars().count() >= MIN_SCOPE_WORD_CHARS
            && !STOP_WORDS.contains(&word.as_str())
            && !scope.contains(&word)
        {
            scope.push(word);
        }
    }
    scope
}

pub fn classify_intent(text: &str, scope: &[String]) -> Intent {
    let tokens = tokenize(text);
    if is_short_ack(&tokens) {
        return Intent::ShortAck;
    }
    if references_scope(&tokens, scope) {
        return Intent::OnTopic;
    }
    Intent::OffTopic
}
