// Conversation flow: end-of-session detection, intent heuristics, the
// rule-based responder, and the per-session state machine.

pub mod end_detector;
pub mod engine;
pub mod fallback;
pub mod handlers;
pub mod intent;
pub mod registry;
