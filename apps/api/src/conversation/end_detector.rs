/// Words that end the session from any phase.
pub const END_KEYWORDS: &[&str] = &["exit", "quit", "bye", "goodbye", "stop", "end"];

/// True when any whitespace-separated token of `text`, case-folded and with
/// surrounding punctuation removed, is exactly an end keyword. Words that
/// merely contain one ("byegones", "end-to-end") do not match.
pub fn is_end_signal(text: &str) -> bool {
    text.split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .any(|token| END_KEYWORDS.contains(&token.as_str()))
}
