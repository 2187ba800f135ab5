pub mod input;
pub mod messages;
pub mod resolver;
pub mod types;
pub mod validator;

pub use input::{RawSetScore, parse_sets};
pub use messages::{MessageKey, MessageParams};
pub use resolver::{authoritative_winner, resolve};
pub use types::{MatchScore, Retirement, ScoreSheet, ScoringFormat, SetScore, TiebreakPoints};
pub use validator::{ScoreValidator, ValidationIssue, ValidationReport, validate};
