use anyhow::{Result, bail};
use serde::Deserialize;

use super::types::{SetScore, TiebreakPoints};

/// Set score as it arrives from storage.
///
/// Two historical shapes exist for tiebreak points:
/// - nested: `{"a": 7, "b": 6, "tiebreak": {"a": 7, "b": 5}}`
/// - flat: `{"a": 7, "b": 6, "tiebreakA": 7, "tiebreakB": 5}`
///
/// Both are normalized into [`SetScore`] right here; nothing past this
/// boundary knows the flat shape existed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSetScore {
    pub a: i32,
    pub b: i32,
    #[serde(default)]
    pub tiebreak: Option<TiebreakPoints>,
    #[serde(default)]
    pub tiebreak_a: Option<i32>,
    #[serde(default)]
    pub tiebreak_b: Option<i32>,
}

impl RawSetScore {
    pub fn normalize(self) -> Result<SetScore> {
        let flat = match (self.tiebreak_a, self.tiebreak_b) {
            (Some(a), Some(b)) => Some(TiebreakPoints { a, b }),
            (None, None) => None,
            _ => bail!("Tiebreak points recorded for only one side"),
        };

        let tiebreak = match (self.tiebreak, flat) {
            (Some(nested), Some(flat)) if nested != flat => {
                bail!("Conflicting tiebreak points: {:?} vs {:?}", nested, flat)
            }
            (nested, flat) => nested.or(flat),
        };

        Ok(SetScore {
            a: self.a,
            b: self.b,
            tiebreak,
        })
    }
}

impl TryFrom<RawSetScore> for SetScore {
    type Error = anyhow::Error;

    fn try_from(raw: RawSetScore) -> Result<Self> {
        raw.normalize()
    }
}

/// Parses a JSON array of sets in any supported shape
pub fn parse_sets(json: &str) -> Result<Vec<SetScore>> {
    let sets: Vec<SetScore> = serde_json::from_str(json)?;
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_and_flat_shapes_normalize_identically() {
        let nested = parse_sets(r#"[{"a":7,"b":6,"tiebreak":{"a":7,"b":5}}]"#).unwrap();
        let flat = parse_sets(r#"[{"a":7,"b":6,"tiebreakA":7,"tiebreakB":5}]"#).unwrap();
        assert_eq!(nested, flat);
        assert_eq!(nested[0], SetScore::with_tiebreak(7, 6, 7, 5));
    }

    #[test]
    fn test_plain_set_has_no_tiebreak() {
        let sets = parse_sets(r#"[{"a":6,"b":4}]"#).unwrap();
        assert_eq!(sets[0], SetScore::new(6, 4));
    }

    #[test]
    fn test_half_flat_tiebreak_is_rejected() {
        assert!(parse_sets(r#"[{"a":7,"b":6,"tiebreakA":7}]"#).is_err());
    }

    #[test]
    fn test_conflicting_shapes_are_rejected() {
        let json = r#"[{"a":7,"b":6,"tiebreak":{"a":7,"b":5},"tiebreakA":9,"tiebreakB":7}]"#;
        assert!(parse_sets(json).is_err());
    }

    #[test]
    fn test_agreeing_shapes_are_accepted() {
        let json = r#"[{"a":7,"b":6,"tiebreak":{"a":7,"b":5},"tiebreakA":7,"tiebreakB":5}]"#;
        assert_eq!(parse_sets(json).unwrap()[0], SetScore::with_tiebreak(7, 6, 7, 5));
    }

    #[test]
    fn test_canonical_output_uses_nested_shape() {
        let set = SetScore::with_tiebreak(6, 7, 4, 7);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"a":6,"b":7,"tiebreak":{"a":4,"b":7}}"#);
    }
}
