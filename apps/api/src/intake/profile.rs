use serde::{Deserialize, Serialize};

use crate::intake::fields::FieldId;
use crate::intake::validation::FieldValue;

/// Candidate details collected so far. A field is `Some` only after its
/// validator accepted it; values are never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<f64>,
    pub desired_roles: Option<Vec<String>>,
    pub location: Option<String>,
    pub tech_stack: Option<Vec<String>>,
}

impl CandidateProfile {
    /// Records an accepted value. Returns false (and leaves the profile
    /// untouched) if the field is already filled or the value shape does not
    /// fit the field.
    pub fn record(&mut self, field: FieldId, value: FieldValue) -> bool {
        if self.has(field) {
            return false;
        }
        match (field, value) {
            (FieldId::FullName, FieldValue::Text(v)) => self.full_name = Some(v),
            (FieldId::Email, FieldValue::Text(v)) => self.email = Some(v),
            (FieldId::Phone, FieldValue::Text(v)) => self.phone = Some(v),
            (FieldId::YearsExperience, FieldValue::Number(v)) => self.years_experience = Some(v),
            (FieldId::DesiredRoles, FieldValue::List(v)) => self.desired_roles = Some(v),
            (FieldId::Location, FieldValue::Text(v)) => self.location = Some(v),
            (FieldId::TechStack, FieldValue::List(v)) => self.tech_stack = Some(v),
            _ => return false,
        }
        true
    }

    pub fn has(&self, field: FieldId) -> bool {
        match field {
            FieldId::FullName => self.full_name.is_some(),
            FieldId::Email => self.email.is_some(),
            FieldId::Phone => self.phone.is_some(),
            FieldId::YearsExperience => self.years_experience.is_some(),
            FieldId::DesiredRoles => self.desired_roles.is_some(),
            FieldId::Location => self.location.is_some(),
            FieldId::TechStack => self.tech_stack.is_some(),
        }
    }

    pub fn tech_keywords(&self) -> &[String] {
        self.tech_stack.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fills_matching_field() {
        let mut profile = CandidateProfile::default();
        assert!(profile.record(FieldId::FullName, FieldValue::Text("Jane Doe".into())));
        assert_eq!(profile.full_name.as_deref(), Some("Jane Doe"));
        assert!(profile.has(FieldId::FullName));
        assert!(!profile.has(FieldId::Email));
    }

    #[test]
    fn test_record_is_append_only() {
        let mut profile = CandidateProfile::default();
        assert!(profile.record(FieldId::Location, FieldValue::Text("Remote".into())));
        assert!(!profile.record(FieldId::Location, FieldValue::Text("Berlin".into())));
        assert_eq!(profile.location.as_deref(), Some("Remote"));
    }

    #[test]
    fn test_record_rejects_mismatched_shape() {
        let mut profile = CandidateProfile::default();
        assert!(!profile.record(FieldId::YearsExperience, FieldValue::Text("3".into())));
        assert!(profile.years_experience.is_none());
    }

    #[test]
    fn test_tech_keywords_empty_until_recorded() {
        let mut profile = CandidateProfile::default();
        assert!(profile.tech_keywords().is_empty());
        profile.record(
            FieldId::TechStack,
            FieldValue::List(vec!["python".into(), "go".into()]),
        );
        assert_eq!(profile.tech_keywords(), ["python", "go"]);
    }
}
