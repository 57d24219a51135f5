//! Tech-stack normalizer: turns a free-text stack answer into ordered,
//! de-duplicated keyword tokens.
//!
//! Algorithm:
//! 1. Split on `,` `/` `|` `;` and whitespace runs; drop the connector words
//!    "and" / "&"
//! 2. Case-fold each token
//! 3. Look the raw token up in the synonym table, then strip surrounding
//!    punctuation and look it up again
//! 4. Drop empty tokens and keep the first occurrence of each keyword
//!
//! Unknown technologies are kept. They simply have no bank entry.

use std::collections::HashSet;

const DELIMITERS: &[char] = &[',', '/', '|', ';'];
const CONNECTORS: &[&str] = &["and", "&"];

/// raw token -> canonical keyword. Canonical keywords are never keys, so
/// normalizing an already-normalized sequence is the identity.
const SYNONYMS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ecmascript", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("python3", "python"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("nodejs", "node"),
    ("node.js", "node"),
    ("pgsql", "postgresql"),
    ("postgres", "postgresql"),
    ("postgre", "postgresql"),
    ("mongo", "mongodb"),
    ("tf", "tensorflow"),
    ("sklearn", "scikit-learn"),
    ("golang", "go"),
    ("k8s", "kubernetes"),
    ("rustlang", "rust"),
    ("amazon-web-services", "aws"),
];

/// Characters kept at token edges: `c++`, `c#`, `f#`.
fn is_edge_punctuation(c: char) -> bool {
    !c.is_alphanumeric() && c != '+' && c != '#'
}

fn synonym(token: &str) -> Option<&'static str> {
    SYNONYMS
        .iter()
        .find(|(raw, _)| *raw == token)
        .map(|(_, canonical)| *canonical)
}

fn canonicalize(token: &str) -> String {
    let lowered = token.to_lowercase();
    if let Some(canonical) = synonym(&lowered) {
        return canonical.to_string();
    }
    let stripped = lowered.trim_matches(is_edge_punctuation);
    synonym(stripped)
        .map(String::from)
        .unwrap_or_else(|| stripped.to_string())
}

/// Normalizes a raw tech-stack answer into keywords in first-seen order.
pub fn normalize_tech_stack(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    let tokens = raw
        .split(|c: char| DELIMITERS.contains(&c) || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter(|t| !CONNECTORS.contains(&t.to_lowercase().as_str()));

    for token in tokens {
        let keyword = canonicalize(token);
        if keyword.is_empty() || CONNECTORS.contains(&keyword.as_str()) {
            continue;
        }
        if seen.insert(keyword.clone()) {
            keywords.push(keyword);
        }
    }

    keywords
}
