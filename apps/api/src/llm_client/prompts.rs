// Prompt constants for the generative backend.
// The backend never sees candidate contact details; only tech keywords and
// the recent interview turns are sent.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

pub const QUESTION_GENERATION_PROMPT: &str = r#"Write exactly {count} technical screening questions for a candidate whose tech stack is: {keywords}.

RULES:
1. Spread the questions across the listed technologies, in the order given.
2. Each question is a single sentence that can be answered briefly in a chat.
3. No duplicates, no numbering, no answers.
4. Return ONLY a JSON array of strings, e.g. ["Question one?", "Question two?"]"#;

/// Persona for free-form replies during the interview.
pub const HIRING_ASSISTANT_SYSTEM: &str = "\
You are a hiring assistant for a tech recruitment agency. Keep answers concise, \
stay within hiring and tech-screening topics only. If asked unrelated questions, \
politely refuse and redirect to hiring-related topics. Never promise salaries, \
offers, or interview dates.";

pub fn question_generation_prompt(keywords: &[String], count: usize) -> String {
    QUESTION_GENERATION_PROMPT
        .replace("{count}", &count.to_string())
        .replace("{keywords}", &keywords.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_prompt_substitutes_placeholders() {
        let prompt = question_generation_prompt(&["python".into(), "go".into()], 5);
        assert!(prompt.starts_with("Write exactly 5 technical"));
        assert!(prompt.contains("python, go"));
        assert!(!prompt.contains("{count}"));
        assert!(!prompt.contains("{keywords}"));
    }
}
