use std::cmp::Reverse;
use std::collections::HashMap;

use anyhow::{Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::domain::{ParticipantId, ResolvedMatch, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentStanding {
    pub participant_id: ParticipantId,
    pub wins: u32,
    pub losses: u32,
    pub rank: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    wins: u32,
    losses: u32,
}

/// Ranks a tournament roster from its resolved matches.
///
/// Order: wins descending, losses ascending, then head-to-head wins among the
/// tied participants, then roster order. Ranks are contiguous from 1.
/// Matches without a winner are skipped; matches of other tournaments are ignored.
pub fn compute_standings(
    tournament_id: &str,
    matches: &[ResolvedMatch],
    roster: &[ParticipantId],
) -> Result<Vec<TournamentStanding>> {
    let positions = index_roster(roster)?;
    let mut tallies = vec![Tally::default(); roster.len()];
    let mut head_to_head: HashMap<(usize, usize), u32> = HashMap::new();
    let mut counted = 0;

    for resolved in matches {
        if let Some(other) = &resolved.tournament_id {
            if other != tournament_id {
                debug!(
                    "Ignoring match {} of tournament {} while ranking {}",
                    resolved.match_id, other, tournament_id
                );
                continue;
            }
        }

        let side_a = lookup(&positions, resolved, Side::A)?;
        let side_b = lookup(&positions, resolved, Side::B)?;
        if side_a == side_b {
            bail!(
                "Match {} pits {} against itself",
                resolved.match_id,
                resolved.side_a
            );
        }

        let Some(winner) = resolved.winner else {
            continue;
        };
        let (winner_idx, loser_idx) = match winner {
            Side::A => (side_a, side_b),
            Side::B => (side_b, side_a),
        };

        tallies[winner_idx].wins += 1;
        tallies[loser_idx].losses += 1;
        *head_to_head.entry((winner_idx, loser_idx)).or_insert(0) += 1;
        counted += 1;
    }

    let order = rank_order(&tallies, &head_to_head);
    info!(
        "Computed standings for tournament {}: {} participants, {} decided matches",
        tournament_id,
        roster.len(),
        counted
    );

    Ok(order
        .into_iter()
        .enumerate()
        .map(|(position, idx)| TournamentStanding {
            participant_id: roster[idx].clone(),
            wins: tallies[idx].wins,
            losses: tallies[idx].losses,
            rank: position as u32 + 1,
        })
        .collect())
}

fn index_roster(roster: &[ParticipantId]) -> Result<HashMap<&str, usize>> {
    let mut positions = HashMap::with_capacity(roster.len());
    for (idx, participant) in roster.iter().enumerate() {
        if participant.is_empty() {
            bail!("Roster entry {} has an empty participant id", idx + 1);
        }
        if positions.insert(participant.as_str(), idx).is_some() {
            bail!("Participant {} appears twice in the roster", participant);
        }
    }
    Ok(positions)
}

fn lookup(positions: &HashMap<&str, usize>, resolved: &ResolvedMatch, side: Side) -> Result<usize> {
    let participant = resolved.participant(side);
    match positions.get(participant) {
        Some(&idx) => Ok(idx),
        None => bail!(
            "Match {} references {} which is not on the roster",
            resolved.match_id,
            participant
        ),
    }
}

fn rank_order(tallies: &[Tally], head_to_head: &HashMap<(usize, usize), u32>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tallies.len()).collect();
    order.sort_by_key(|&idx| (Reverse(tallies[idx].wins), tallies[idx].losses, idx));

    let mut start = 0;
    while start < order.len() {
        let record = |idx: usize| (tallies[idx].wins, tallies[idx].losses);
        let current = record(order[start]);
        let end = order[start..]
            .iter()
            .position(|&idx| record(idx) != current)
            .map_or(order.len(), |offset| start + offset);

        if end - start > 1 {
            break_ties(&mut order[start..end], head_to_head);
        }
        start = end;
    }

    order
}

/// Orders a group with identical records by wins against each other, then roster order
fn break_ties(group: &mut [usize], head_to_head: &HashMap<(usize, usize), u32>) {
    let members = group.to_vec();
    let mini_league_wins = |idx: usize| -> u32 {
        members
            .iter()
            .filter(|&&other| other != idx)
            .map(|&other| head_to_head.get(&(idx, other)).copied().unwrap_or(0))
            .sum()
    };
    group.sort_by_key(|&idx| (Reverse(mini_league_wins(idx)), idx));
}
