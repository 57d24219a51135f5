//! Field validators: pure checks that accept and normalize one raw answer or
//! report why it was rejected.
//!
//! Rejections are not errors: the engine re-prompts for the same field with
//! the human-readable message and there is no retry limit.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::intake::fields::{FieldId, FIELD_SPECS};
use crate::questions::tech_stack::normalize_tech_stack;

const MAX_NAME_CHARS: usize = 100;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_YEARS_EXPERIENCE: f64 = 60.0;

/// Unit words tolerated after the number in the years-of-experience answer.
const YEAR_UNITS: &[&str] = &["years", "year", "yrs", "yr"];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is a valid regex")
});

/// Why a field value was rejected. Serializes as the stable kebab-case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    InvalidEmailFormat,
    InvalidPhoneFormat,
    InvalidExperienceRange,
    NotANumber,
    EmptyName,
    NameTooLong,
    EmptyField,
    NoRecognizedTechnology,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidEmailFormat => "invalid-email-format",
            RejectionReason::InvalidPhoneFormat => "invalid-phone-format",
            RejectionReason::InvalidExperienceRange => "invalid-experience-range",
            RejectionReason::NotANumber => "not-a-number",
            RejectionReason::EmptyName => "empty-name",
            RejectionReason::NameTooLong => "name-too-long",
            RejectionReason::EmptyField => "empty-field",
            RejectionReason::NoRecognizedTechnology => "no-recognized-technology",
        }
    }

    /// Text shown to the candidate ahead of the re-emitted prompt.
    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::InvalidEmailFormat => {
                "That doesn't look like a valid email address."
            }
            RejectionReason::InvalidPhoneFormat => {
                "That phone number seems invalid. It should have 7 to 15 digits; include the country code if possible."
            }
            RejectionReason::InvalidExperienceRange => {
                "Years of experience must be between 0 and 60."
            }
            RejectionReason::NotANumber => {
                "Please enter a number for years of experience (e.g., 2 or 3.5)."
            }
            RejectionReason::EmptyName => "I didn't catch your name.",
            RejectionReason::NameTooLong => "That name is too long (100 characters at most).",
            RejectionReason::EmptyField => "This field cannot be empty.",
            RejectionReason::NoRecognizedTechnology => {
                "I couldn't find any technologies in that answer."
            }
        }
    }
}

/// A normalized, accepted field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

/// Outcome of validating one raw answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Accepted(FieldValue),
    Rejected(RejectionReason),
}

/// Runs the validator registered for `field` in the collection table.
pub fn validate(field: FieldId, raw: &str) -> Validation {
    match FIELD_SPECS.iter().find(|spec| spec.id == field) {
        Some(spec) => (spec.validator)(raw),
        None => Validation::Rejected(RejectionReason::EmptyField),
    }
}

pub fn validate_name(raw: &str) -> Validation {
    let name = raw.trim();
    if name.is_empty() {
        return Validation::Rejected(RejectionReason::EmptyName);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Validation::Rejected(RejectionReason::NameTooLong);
    }
    Validation::Accepted(FieldValue::Text(name.to_string()))
}

/// local@domain with at least one dot in the domain. The domain part is
/// lower-cased; the local part is kept as typed.
pub fn validate_email(raw: &str) -> Validation {
    let email = raw.trim();
    if !EMAIL_RE.is_match(email) {
        return Validation::Rejected(RejectionReason::InvalidEmailFormat);
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => Validation::Accepted(FieldValue::Text(format!(
            "{local}@{}",
            domain.to_ascii_lowercase()
        ))),
        None => Validation::Rejected(RejectionReason::InvalidEmailFormat),
    }
}

/// Strips `+`, `-`, spaces and parentheses; anything else that is not a digit
/// rejects. The normalized value keeps a leading `+` when one was given.
pub fn validate_phone(raw: &str) -> Validation {
    let phone = raw.trim();
    let mut digits = String::with_capacity(phone.len());

    for c in phone.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '+' | '-' | ' ' | '(' | ')' => {}
            _ => return Validation::Rejected(RejectionReason::InvalidPhoneFormat),
        }
    }

    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Validation::Rejected(RejectionReason::InvalidPhoneFormat);
    }

    let normalized = if phone.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    };
    Validation::Accepted(FieldValue::Text(normalized))
}

pub fn validate_years_experience(raw: &str) -> Validation {
    let lowered = raw.trim().to_lowercase();
    let number = YEAR_UNITS
        .iter()
        .find_map(|unit| lowered.strip_suffix(unit))
        .unwrap_or(&lowered)
        .trim();

    let years = match number.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return Validation::Rejected(RejectionReason::NotANumber),
    };

    if !(0.0..=MAX_YEARS_EXPERIENCE).contains(&years) {
        return Validation::Rejected(RejectionReason::InvalidExperienceRange);
    }

    Validation::Accepted(FieldValue::Number(years))
}

/// Splits on `,` `/` `;` into an ordered list of role titles.
pub fn validate_desired_roles(raw: &str) -> Validation {
    let roles: Vec<String> = raw
        .split([',', '/', ';'])
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();

    if roles.is_empty() {
        return Validation::Rejected(RejectionReason::EmptyField);
    }
    Validation::Accepted(FieldValue::List(roles))
}

pub fn validate_location(raw: &str) -> Validation {
    let location = raw.trim();
    if location.is_empty() {
        return Validation::Rejected(RejectionReason::EmptyField);
    }
    Validation::Accepted(FieldValue::Text(location.to_string()))
}

/// Non-empty text that must normalize to at least one keyword, so question
/// generation never starts from an empty stack.
pub fn validate_tech_stack(raw: &str) -> Validation {
    if raw.trim().is_empty() {
        return Validation::Rejected(RejectionReason::EmptyField);
    }
    let keywords = normalize_tech_stack(raw);
    if keywords.is_empty() {
        return Validation::Rejected(RejectionReason::NoRecognizedTechnology);
    }
    Validation::Accepted(FieldValue::List(keywords))
}
