pub mod decide;

pub use decide::{MAX_MATCH_MESSAGES, Verdict, decide};
