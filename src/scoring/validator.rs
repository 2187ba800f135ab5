use log::debug;
use serde::Serialize;

use super::messages::{MessageFormatter, MessageKey, MessageParams, default_message};
use super::types::{MatchScore, Retirement, ScoringFormat, SetScore, TiebreakPoints};
use crate::config::settings::ScoringSettings;
use crate::domain::Side;

/// Index of the deciding set, the only one played as a super tiebreak
const DECIDING_SET_INDEX: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub key: MessageKey,
    /// 0-based index of the offending set, if the issue is about one set
    pub set_index: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_error(&self, key: MessageKey) -> bool {
        self.errors.iter().any(|issue| issue.key == key)
    }

    pub fn has_warning(&self, key: MessageKey) -> bool {
        self.warnings.iter().any(|issue| issue.key == key)
    }
}

/// Checks set scores against the scoring grammar of a format.
///
/// Pass/fail depends only on numeric comparisons; the formatter is used
/// to render messages and nothing else.
pub struct ScoreValidator {
    settings: ScoringSettings,
    formatter: Option<MessageFormatter>,
}

impl Default for ScoreValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreValidator {
    pub fn new() -> Self {
        Self::from_settings(ScoringSettings::default())
    }

    pub fn from_settings(settings: ScoringSettings) -> Self {
        Self {
            settings,
            formatter: None,
        }
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(MessageKey, &MessageParams) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Box::new(formatter));
        self
    }

    pub fn validate(&self, sets: &[SetScore], format: ScoringFormat) -> ValidationReport {
        let mut run = ValidationRun::new(self, format, sets.len());

        if sets.is_empty() {
            run.error(MessageKey::NoSets, None);
            return run.finish();
        }

        if sets.len() > self.settings.max_sets {
            run.error(MessageKey::TooManySets, None);
        }

        let mut sets_won = [0usize; 2];
        for (index, set) in sets.iter().enumerate() {
            if sets_won.iter().any(|&won| won >= self.settings.sets_to_win) {
                run.warning(MessageKey::SetAfterDecision, Some(index));
            }

            if run.check_set(index, set) {
                if let Some(side) = set.winner() {
                    sets_won[side_index(side)] += 1;
                }
            }
        }

        run.finish()
    }

    /// Validates a played score that may have ended in a retirement.
    ///
    /// Only the sets before the retirement are held to the grammar; the set
    /// the player retired in must have been recorded.
    pub fn validate_played(
        &self,
        sets: &[SetScore],
        retirement: Option<Retirement>,
        format: ScoringFormat,
    ) -> ValidationReport {
        let Some(retired) = retirement else {
            return self.validate(sets, format);
        };

        if retired.set_index >= sets.len() {
            let mut run = ValidationRun::new(self, format, sets.len());
            run.error(MessageKey::RetirementOutOfRange, Some(retired.set_index));
            return run.finish();
        }

        let completed = &sets[..retired.set_index];
        if completed.is_empty() {
            return ValidationRun::new(self, format, sets.len()).finish();
        }
        self.validate(completed, format)
    }

    /// Validates a stored score. A walkover carries no sets to check.
    pub fn validate_match(&self, score: &MatchScore) -> ValidationReport {
        if score.walkover {
            return ValidationRun::new(self, score.format, 0).finish();
        }
        self.validate_played(&score.sets, score.retirement, score.format)
    }
}

/// Convenience entry point using the default settings and messages
pub fn validate(sets: &[SetScore], format: ScoringFormat) -> ValidationReport {
    ScoreValidator::new().validate(sets, format)
}

fn side_index(side: Side) -> usize {
    match side {
        Side::A => 0,
        Side::B => 1,
    }
}

struct ValidationRun<'v> {
    validator: &'v ScoreValidator,
    format: ScoringFormat,
    set_count: usize,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl<'v> ValidationRun<'v> {
    fn new(validator: &'v ScoreValidator, format: ScoringFormat, set_count: usize) -> Self {
        Self {
            validator,
            format,
            set_count,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true when the set is free of errors
    fn check_set(&mut self, index: usize, set: &SetScore) -> bool {
        let errors_before = self.errors.len();
        let g = self.format.games_per_set();

        if !(0..=g + 1).contains(&set.a) || !(0..=g + 1).contains(&set.b) {
            self.error(MessageKey::GamesOutOfRange, Some(index));
            return false;
        }

        if set.a >= g && set.b >= g {
            self.check_tiebreak_set(index, set);
            return self.errors.len() == errors_before;
        }

        if set.tiebreak.is_some() {
            self.error(MessageKey::TiebreakNotAllowed, Some(index));
        }

        let winning = set.a.max(set.b);
        let losing = set.a.min(set.b);

        if winning < g {
            let key = if winning == losing {
                MessageKey::SetUnfinished
            } else {
                MessageKey::SetWonBelowThreshold
            };
            self.warning(key, Some(index));
        } else if !self.is_regular_finish(winning, losing) {
            self.error(MessageKey::InvalidSetScore, Some(index));
        }

        self.errors.len() == errors_before
    }

    fn is_regular_finish(&self, winning: i32, losing: i32) -> bool {
        let g = self.format.games_per_set();
        (winning == g && losing <= g - 2)
            || (self.format.allows_extended_finish() && winning == g + 1 && losing == g - 1)
    }

    /// Both sides reached the threshold: only `g:g` or `g+1:g` with a tiebreak
    fn check_tiebreak_set(&mut self, index: usize, set: &SetScore) {
        let g = self.format.games_per_set();

        if set.a == g + 1 && set.b == g + 1 {
            self.error(MessageKey::InvalidSetScore, Some(index));
            return;
        }

        let Some(tiebreak) = set.tiebreak else {
            self.error(MessageKey::TiebreakRequired, Some(index));
            return;
        };

        if !self.check_tiebreak_points(index, &tiebreak) {
            return;
        }

        if set.a != set.b {
            let games_winner = if set.a > set.b { Side::A } else { Side::B };
            if tiebreak.winner() != Some(games_winner) {
                self.error(MessageKey::TiebreakContradictsSet, Some(index));
            }
        }
    }

    fn check_tiebreak_points(&mut self, index: usize, tiebreak: &TiebreakPoints) -> bool {
        if tiebreak.a < 0 || tiebreak.b < 0 {
            self.error(MessageKey::TiebreakNegative, Some(index));
            return false;
        }

        let mut ok = true;
        if tiebreak.margin() < self.validator.settings.tiebreak_margin {
            self.error(MessageKey::TiebreakMargin, Some(index));
            ok = false;
        }
        if tiebreak.winning_points() < self.minimum_points(index) {
            self.error(MessageKey::TiebreakMinimum, Some(index));
            ok = false;
        }
        ok
    }

    fn minimum_points(&self, index: usize) -> i32 {
        if index == DECIDING_SET_INDEX {
            self.validator.settings.super_tiebreak_points
        } else {
            self.validator.settings.tiebreak_points
        }
    }

    fn error(&mut self, key: MessageKey, set_index: Option<usize>) {
        let issue = self.issue(key, set_index);
        debug!("Score validation error: {}", issue.message);
        self.errors.push(issue);
    }

    fn warning(&mut self, key: MessageKey, set_index: Option<usize>) {
        let issue = self.issue(key, set_index);
        debug!("Score validation warning: {}", issue.message);
        self.warnings.push(issue);
    }

    fn issue(&self, key: MessageKey, set_index: Option<usize>) -> ValidationIssue {
        let g = self.format.games_per_set();
        let params = MessageParams {
            set: set_index.map(|i| i + 1),
            games_per_set: g,
            max_games: g + 1,
            minimum_points: set_index.map(|i| self.minimum_points(i)).unwrap_or(0),
            count: self.set_count,
        };
        let message = match &self.validator.formatter {
            Some(formatter) => formatter(key, &params),
            None => default_message(key, &params),
        };
        ValidationIssue {
            key,
            set_index,
            message,
        }
    }

    fn finish(self) -> ValidationReport {
        ValidationReport {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(sets: &[SetScore]) -> ValidationReport {
        validate(sets, ScoringFormat::Standard)
    }

    fn short(sets: &[SetScore]) -> ValidationReport {
        validate(sets, ScoringFormat::Short)
    }

    #[test]
    fn test_regular_set_is_valid() {
        let report = standard(&[SetScore::new(6, 4)]);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_tiebreak_set_is_valid() {
        let report = standard(&[SetScore::with_tiebreak(7, 6, 7, 5)]);
        assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn test_tiebreak_margin_below_two_is_error() {
        let report = standard(&[SetScore::with_tiebreak(7, 6, 8, 7)]);
        assert!(!report.is_valid);
        assert!(report.has_error(MessageKey::TiebreakMargin));
    }

    #[test]
    fn test_missing_tiebreak_is_error() {
        let report = standard(&[SetScore::new(6, 6)]);
        assert!(!report.is_valid);
        assert!(report.has_error(MessageKey::TiebreakRequired));

        let report = standard(&[SetScore::new(7, 6)]);
        assert!(report.has_error(MessageKey::TiebreakRequired));
    }

    #[test]
    fn test_no_sets_is_error() {
        let report = standard(&[]);
        assert!(!report.is_valid);
        assert!(report.has_error(MessageKey::NoSets));
    }

    #[test]
    fn test_six_five_without_tiebreak_is_error() {
        let report = standard(&[SetScore::new(6, 5)]);
        assert!(report.has_error(MessageKey::InvalidSetScore));
    }

    #[test]
    fn test_seven_five_is_valid() {
        assert!(standard(&[SetScore::new(7, 5), SetScore::new(5, 7)]).is_valid);
    }

    #[test]
    fn test_seven_four_is_error() {
        assert!(standard(&[SetScore::new(7, 4)]).has_error(MessageKey::InvalidSetScore));
    }

    #[test]
    fn test_games_out_of_range() {
        assert!(standard(&[SetScore::new(8, 6)]).has_error(MessageKey::GamesOutOfRange));
        assert!(standard(&[SetScore::new(-1, 6)]).has_error(MessageKey::GamesOutOfRange));
    }

    #[test]
    fn test_short_format() {
        assert!(short(&[SetScore::new(4, 2)]).is_valid);

        let report = short(&[SetScore::new(5, 3)]);
        assert!(!report.is_valid);
        assert!(report.has_error(MessageKey::InvalidSetScore));

        assert!(short(&[SetScore::new(4, 3)]).has_error(MessageKey::InvalidSetScore));
        assert!(short(&[SetScore::with_tiebreak(5, 4, 7, 3)]).is_valid);
    }

    #[test]
    fn test_win_below_threshold_is_warning_only() {
        let report = standard(&[SetScore::new(4, 2)]);
        assert!(report.is_valid);
        assert!(report.has_warning(MessageKey::SetWonBelowThreshold));
    }

    #[test]
    fn test_unfinished_set_is_warning() {
        let report = standard(&[SetScore::new(6, 3), SetScore::new(3, 3)]);
        assert!(report.is_valid);
        assert!(report.has_warning(MessageKey::SetUnfinished));
    }

    #[test]
    fn test_super_tiebreak_needs_ten_points() {
        let sets = [
            SetScore::new(6, 4),
            SetScore::new(3, 6),
            SetScore::with_tiebreak(7, 6, 8, 6),
        ];
        let report = standard(&sets);
        assert!(report.has_error(MessageKey::TiebreakMinimum));

        let sets = [
            SetScore::new(6, 4),
            SetScore::new(3, 6),
            SetScore::with_tiebreak(7, 6, 10, 8),
        ];
        assert!(standard(&sets).is_valid);
    }

    #[test]
    fn test_regular_tiebreak_needs_seven_points() {
        let report = standard(&[SetScore::with_tiebreak(7, 6, 6, 4)]);
        assert!(report.has_error(MessageKey::TiebreakMinimum));
    }

    #[test]
    fn test_tiebreak_outside_threshold_is_error() {
        let report = standard(&[SetScore::with_tiebreak(6, 3, 7, 5)]);
        assert!(report.has_error(MessageKey::TiebreakNotAllowed));
    }

    #[test]
    fn test_tiebreak_must_agree_with_games() {
        let report = standard(&[SetScore::with_tiebreak(7, 6, 4, 7)]);
        assert!(report.has_error(MessageKey::TiebreakContradictsSet));
    }

    #[test]
    fn test_too_many_sets() {
        let sets = [SetScore::new(6, 4); 4];
        assert!(standard(&sets).has_error(MessageKey::TooManySets));
    }

    #[test]
    fn test_set_after_decision_is_warning() {
        let sets = [SetScore::new(6, 4), SetScore::new(6, 2), SetScore::new(2, 6)];
        let report = standard(&sets);
        assert!(report.is_valid);
        assert!(report.has_warning(MessageKey::SetAfterDecision));
    }

    #[test]
    fn test_formatter_changes_text_but_not_outcome() {
        let validator = ScoreValidator::new()
            .with_formatter(|key, params| format!("{}#{}", key.as_str(), params.set.unwrap_or(0)));
        let sets = [SetScore::new(6, 6)];

        let custom = validator.validate(&sets, ScoringFormat::Standard);
        let default = standard(&sets);

        assert_eq!(custom.is_valid, default.is_valid);
        assert_eq!(custom.errors.len(), default.errors.len());
        assert_eq!(custom.errors[0].message, "score.tiebreak_required#1");
        assert_ne!(custom.errors[0].message, default.errors[0].message);
    }

    fn retired(set_index: usize) -> Option<Retirement> {
        Some(Retirement {
            set_index,
            retired_side: Side::A,
        })
    }

    #[test]
    fn test_retirement_outside_recorded_sets_is_error() {
        let validator = ScoreValidator::new();
        let sets = [SetScore::new(6, 2), SetScore::new(6, 3)];

        let report = validator.validate_played(&sets, retired(2), ScoringFormat::Standard);
        assert!(!report.is_valid);
        assert!(report.has_error(MessageKey::RetirementOutOfRange));

        let report = validator.validate_played(&[], retired(0), ScoringFormat::Standard);
        assert!(report.has_error(MessageKey::RetirementOutOfRange));
    }

    #[test]
    fn test_retired_set_is_not_held_to_grammar() {
        let validator = ScoreValidator::new();
        let sets = [SetScore::new(6, 2), SetScore::new(1, 3)];
        let report = validator.validate_played(&sets, retired(1), ScoringFormat::Standard);
        assert!(report.is_valid);

        let broken = [SetScore::new(6, 6), SetScore::new(1, 3)];
        let report = validator.validate_played(&broken, retired(1), ScoringFormat::Standard);
        assert!(report.has_error(MessageKey::TiebreakRequired));

        let first_set = [SetScore::new(2, 1)];
        let report = validator.validate_played(&first_set, retired(0), ScoringFormat::Standard);
        assert!(report.is_valid);
    }

    #[test]
    fn test_walkover_score_needs_no_sets() {
        let validator = ScoreValidator::new();
        let walkover = MatchScore {
            walkover: true,
            winner: Some(Side::B),
            ..MatchScore::default()
        };
        assert!(validator.validate_match(&walkover).is_valid);

        let played = MatchScore {
            winner: Some(Side::B),
            ..MatchScore::default()
        };
        assert!(validator.validate_match(&played).has_error(MessageKey::NoSets));
    }
}
