pub mod settings;

pub use settings::{AppConfig, CacheSettings, KFactorSettings, RatingSettings, ScoringSettings};
