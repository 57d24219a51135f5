// Technical question pipeline: tech stack normalization → bank selection, or
// generation through the configured backend with the bank as fallback.
pub mod backend;
pub mod bank;
pub mod selector;
pub mod tech_stack;
