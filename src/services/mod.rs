pub mod processing;
pub mod submission;

pub use processing::{BatchSummary, MatchEntry, ProcessingService, process_entries};
pub use submission::{Confirmation, MatchLocks, SubmissionService};
