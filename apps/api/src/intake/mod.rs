// Candidate intake: the fixed field table, per-field validators, and the
// profile that accumulates accepted values.

pub mod fields;
pub mod profile;
pub mod validation;
