use serde::{Deserialize, Serialize};

use crate::intake::profile::CandidateProfile;
use crate::intake::validation::{
    validate_desired_roles, validate_email, validate_location, validate_name, validate_phone,
    validate_tech_stack, validate_years_experience, Validation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    FullName,
    Email,
    Phone,
    YearsExperience,
    DesiredRoles,
    Location,
    TechStack,
}

/// One step of the collection sequence.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: FieldId,
    pub prompt: &'static str,
    pub validator: fn(&str) -> Validation,
    pub required: bool,
}

/// Collection order. The index into this table is the `Collecting` state.
pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        id: FieldId::FullName,
        prompt: "First, what's your full name?",
        validator: validate_name,
        required: true,
    },
    FieldSpec {
        id: FieldId::Email,
        prompt: "Please share your email address.",
        validator: validate_email,
        required: true,
    },
    FieldSpec {
        id: FieldId::Phone,
        prompt: "What's your phone number (with country code if possible)?",
        validator: validate_phone,
        required: true,
    },
    FieldSpec {
        id: FieldId::YearsExperience,
        prompt: "How many years of experience do you have? (e.g., 2, 3.5)",
        validator: validate_years_experience,
        required: true,
    },
    FieldSpec {
        id: FieldId::DesiredRoles,
        prompt: "What's your desired position(s)?",
        validator: validate_desired_roles,
        required: true,
    },
    FieldSpec {
        id: FieldId::Location,
        prompt: "What's your current location (City, Country)?",
        validator: validate_location,
        required: true,
    },
    FieldSpec {
        id: FieldId::TechStack,
        prompt: "Please list your tech stack (languages, frameworks, databases, tools). \
                 For example: Python, Django, PostgreSQL, Docker",
        validator: validate_tech_stack,
        required: true,
    },
];

pub fn field_spec(index: usize) -> Option<&'static FieldSpec> {
    FIELD_SPECS.get(index)
}

/// Index of the first required field the profile still lacks, or `None` once
/// collection is complete.
pub fn next_required_field(profile: &CandidateProfile) -> Option<usize> {
    FIELD_SPECS
        .iter()
        .position(|spec| spec.required && !profile.has(spec.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_order_is_fixed() {
        let order: Vec<FieldId> = FIELD_SPECS.iter().map(|f| f.id).collect();
        assert_eq!(
            order,
            vec![
                FieldId::FullName,
                FieldId::Email,
                FieldId::Phone,
                FieldId::YearsExperience,
                FieldId::DesiredRoles,
                FieldId::Location,
                FieldId::TechStack,
            ]
        );
    }

    #[test]
    fn test_validators_accept_their_sample() {
        let samples = [
            "Jane Doe",
            "jane@x.com",
            "+1-555-0100",
            "3",
            "Backend Engineer",
            "Remote",
            "Python and Go",
        ];
        for (spec, sample) in FIELD_SPECS.iter().zip(samples) {
            assert!(
                matches!((spec.validator)(sample), Validation::Accepted(_)),
                "{:?} rejected {sample:?}",
                spec.id
            );
            assert!(matches!((spec.validator)(""), Validation::Rejected(_)));
        }
    }

    #[test]
    fn test_next_required_field_walks_the_table() {
        let mut profile = CandidateProfile::default();
        assert_eq!(next_required_field(&profile), Some(0));

        for (index, spec) in FIELD_SPECS.iter().enumerate() {
            assert_eq!(next_required_field(&profile), Some(index));
            let value = match (spec.validator)(match spec.id {
                FieldId::FullName => "Jane Doe",
                FieldId::Email => "jane@x.com",
                FieldId::Phone => "5550100",
                FieldId::YearsExperience => "2",
                FieldId::DesiredRoles => "SRE",
                FieldId::Location => "Remote",
                FieldId::TechStack => "rust",
            }) {
                Validation::Accepted(value) => value,
                Validation::Rejected(reason) => panic!("{reason:?}"),
            };
            assert!(profile.record(spec.id, value));
        }
        assert_eq!(next_required_field(&profile), None);
    }

    #[test]
    fn test_field_spec_out_of_range() {
        assert!(field_spec(FIELD_SPECS.len()).is_none());
        assert_eq!(field_spec(0).map(|f| f.id), Some(FieldId::FullName));
    }
}
