pub mod action;
pub mod detection;

pub use action::{Action, DEFAULT_THRESHOLD, DEFAULT_WAIT_SECONDS, MAX_SECONDS};
pub use detection::{Detection, MatchResult, MatchSource, FALLBACK_BOX_SIZE};
