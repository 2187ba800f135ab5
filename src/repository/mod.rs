pub mod memory;

use anyhow::Result;

use crate::rating::types::{
    CooldownEntry, MatchOutcome, ParticipantSetKey, RatingKey, RatingRecord, RatingUpdate,
};

pub use memory::InMemoryRepository;

/// View of rating storage inside one unit of work.
///
/// Reads see the state the unit of work started from plus nothing written by
/// other writers until it ends.
pub trait RatingStore {
    fn is_processed(&mut self, match_id: &str) -> Result<bool>;

    fn get_rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>>;

    fn get_cooldown(&mut self, key: &ParticipantSetKey) -> Result<Option<CooldownEntry>>;

    /// Stores the outcome, the rating records and the cooldown entry of one match
    fn write(&mut self, update: &RatingUpdate) -> Result<()>;
}

/// Storage seam of the rating engine.
///
/// `transact` runs the whole read-modify-write of a match as one atomic unit:
/// concurrent units on the same storage are serialized, and when `work` fails
/// nothing it wrote is kept.
pub trait RatingRepository {
    fn transact<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn RatingStore) -> Result<T>;

    /// Read outside any unit of work; may be served from a cache
    fn rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>>;

    fn outcome(&mut self, match_id: &str) -> Result<Option<MatchOutcome>>;
}

impl<R: RatingRepository> RatingRepository for &mut R {
    fn transact<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn RatingStore) -> Result<T>,
    {
        (**self).transact(work)
    }

    fn rating(&mut self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        (**self).rating(key)
    }

    fn outcome(&mut self, match_id: &str) -> Result<Option<MatchOutcome>> {
        (**self).outcome(match_id)
    }
}
