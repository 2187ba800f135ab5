pub mod elo;
pub mod engine;
pub mod policy;
pub mod types;

pub use engine::RatingEngine;
pub use policy::k_factor;
pub use types::{
    CooldownEntry, ParticipantSetKey, ParticipantStatus, RatingKey, RatingOutcome, RatingRecord,
    SkipReason,
};
